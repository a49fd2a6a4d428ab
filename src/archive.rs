// Local tar.gz packing/unpacking and directory merging. Blocking; call from spawn_blocking.

use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::Path;

/// Unpacks a gzipped tar stream into `dest` (created if missing). Existing files
/// not in the stream are left alone.
pub fn unpack_tar_gz<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive.set_preserve_permissions(true);
    archive.unpack(dest)
}

pub fn unpack_tar_gz_file(archive: &Path, dest: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    unpack_tar_gz(io::BufReader::new(file), dest)
}

/// Gzipped tar of the contents of `dir`, rooted at `.`.
pub fn tar_gz_dir_bytes(dir: &Path) -> io::Result<Bytes> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(".", dir)?;
    let encoder = builder.into_inner()?;
    Ok(Bytes::from(encoder.finish()?))
}

/// Writes a `.tar.gz` at `dest` holding each `(member, dir)` pair as a top-level directory.
pub fn pack_tar_gz(dest: &Path, members: &[(&str, &Path)]) -> io::Result<()> {
    let file = File::create(dest)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    for (name, dir) in members {
        builder.append_dir_all(name, dir)?;
    }
    let encoder = builder.into_inner()?;
    let mut writer = encoder.finish()?;
    io::Write::flush(&mut writer)?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Copies `src` over `dst`: files are overwritten, directories merged recursively,
/// and anything in `dst` missing from `src` is kept.
pub fn copy_dir_merge(src: &Path, dst: &Path) -> io::Result<u64> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copied += copy_dir_merge(&entry.path(), &target)?;
        } else if file_type.is_symlink() {
            copy_symlink(&entry.path(), &target)?;
            copied += 1;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}
