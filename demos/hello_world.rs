use vfs_mock::{File, FileSystem, MemFs, OpenFlags, read_dir, read_file, write_file};

fn main() {
    // creates an empty in-memory filesystem: only `/` exists and it is the CWD
    let mut fs = MemFs::new();

    // creates `/docs` and `/docs/drafts` in one go
    fs.mkdir_all("/docs/drafts", 0o755).unwrap();

    // change CWD to `/docs`
    fs.chdir("docs").unwrap();

    // creates file `/docs/first.txt`;
    // the file lands in the CWD because the name is relative
    write_file(&mut fs, "first.txt", b"Hello", 0o644).unwrap();

    // creates file `/second.txt`, the name is absolute
    write_file(&mut fs, "/second.txt", b"World", 0o644).unwrap();

    // appends to the first file through a handle
    let mut f = fs
        .open_file("first.txt", OpenFlags::WRONLY | OpenFlags::APPEND, 0)
        .unwrap();
    f.write(b", again").unwrap();
    f.close().unwrap();

    // `/latest` points at the first file
    fs.symlink("/docs/first.txt", "/latest").unwrap();
    assert_eq!(read_file(&mut fs, "/latest").unwrap(), b"Hello, again");

    // lists `/docs` sorted by name
    for entry in read_dir(&mut fs, "/docs").unwrap() {
        println!("{:?} {:o} {}", entry.file_type(), entry.permissions(), entry.name());
    }

    // moves the drafts directory, its content goes along
    fs.rename("/docs/drafts", "/drafts").unwrap();

    // empties the filesystem, the root directory stays
    fs.remove_all("/").unwrap();
    assert!(fs.stat("/second.txt").is_err());
}
