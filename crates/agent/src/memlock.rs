//! Best-effort mlockall(MCL_CURRENT) so the prober keeps running under memory pressure

pub fn lock_current_memory() -> std::io::Result<()> {
    let rc = unsafe { libc::mlockall(libc::MCL_CURRENT) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
