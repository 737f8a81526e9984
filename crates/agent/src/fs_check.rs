//! Best-effort guard against probing a non-local filesystem
//!
//! Not a hardened classifier: an unrecognized magic number is rejected, but
//! the allow-list only covers the common local disk filesystems the
//! original tool targeted.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsCheckError {
    #[error("cannot determine filesystem type: {0}")]
    Statfs(std::io::Error),
    #[error("unknown filesystem type 0x{0:x}; this tool only probes local disk filesystems (no NFS, CIFS, tmpfs, FUSE)")]
    UnknownFilesystem(i64),
}

const BTRFS_SUPER_MAGIC: i64 = 0x9123683e;
const BTRFS_TEST_MAGIC: i64 = 0x73727279;
const EXT_SUPER_MAGIC: i64 = 0x137d;
const EXT2_OLD_SUPER_MAGIC: i64 = 0xef51;
const EXT2_SUPER_MAGIC: i64 = 0xef53;
const HFS_SUPER_MAGIC: i64 = 0x4244;
const HPFS_SUPER_MAGIC: i64 = 0xf995_e849u32 as i64;
const JFFS2_SUPER_MAGIC: i64 = 0x72b6;
const JFS_SUPER_MAGIC: i64 = 0x3153_464a;
const MINIX_SUPER_MAGIC: i64 = 0x137f;
const MINIX_SUPER_MAGIC2: i64 = 0x138f;
const MINIX2_SUPER_MAGIC: i64 = 0x2468;
const MINIX2_SUPER_MAGIC2: i64 = 0x2478;
const MINIX3_SUPER_MAGIC: i64 = 0x4d5a;
const MSDOS_SUPER_MAGIC: i64 = 0x4d44;
const NTFS_SB_MAGIC: i64 = 0x5346_544e;
const REISERFS_SUPER_MAGIC: i64 = 0x5265_4973;
const XFS_SUPER_MAGIC: i64 = 0x5846_5342;
const VXFS_SUPER_MAGIC: i64 = 0xa501_fcf5u32 as i64;
const ZFS_SUPER_MAGIC: i64 = 0x2fc1_2fc1;

pub fn is_known_local_fs(f_type: i64) -> bool {
    matches!(
        f_type,
        BTRFS_SUPER_MAGIC
            | BTRFS_TEST_MAGIC
            | EXT_SUPER_MAGIC
            | EXT2_OLD_SUPER_MAGIC
            | EXT2_SUPER_MAGIC
            | HFS_SUPER_MAGIC
            | HPFS_SUPER_MAGIC
            | JFFS2_SUPER_MAGIC
            | JFS_SUPER_MAGIC
            | MINIX_SUPER_MAGIC
            | MINIX_SUPER_MAGIC2
            | MINIX2_SUPER_MAGIC
            | MINIX2_SUPER_MAGIC2
            | MINIX3_SUPER_MAGIC
            | MSDOS_SUPER_MAGIC
            | NTFS_SB_MAGIC
            | REISERFS_SUPER_MAGIC
            | XFS_SUPER_MAGIC
            | VXFS_SUPER_MAGIC
            | ZFS_SUPER_MAGIC
    )
}

/// `fstatfs` the open file and reject anything not on the local-disk allow-list.
pub fn check_local_fs(file: &File) -> Result<(), FsCheckError> {
    let mut raw: libc::statfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstatfs(file.as_raw_fd(), &mut raw) };
    if rc != 0 {
        return Err(FsCheckError::Statfs(std::io::Error::last_os_error()));
    }
    let f_type = raw.f_type as i64;
    if !is_known_local_fs(f_type) {
        return Err(FsCheckError::UnknownFilesystem(f_type));
    }
    Ok(())
}
