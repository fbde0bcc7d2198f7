use anyhow::Result;

/// Everything in the application runs on one thread; the bridge call is the only thing that
/// suspends.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
