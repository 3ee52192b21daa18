pub trait Client {
    type Error;
    /// Single-turn completion, returning the model's text answer.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>>;
}
