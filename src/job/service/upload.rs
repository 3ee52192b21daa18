use std::path::Path;

pub trait Client {
    type Error;
    /// Transfer `local_path` as `filename`, returning its public URL.
    fn put(
        &self,
        local_path: &Path,
        filename: &str,
    ) -> impl Future<Output = Result<String, Self::Error>>;
}
