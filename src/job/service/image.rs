use derive_debug::Dbg;

/// Source photo handed to an image model alongside the prompt.
#[derive(Dbg, Clone, Copy)]
pub struct Reference<'a> {
    pub mime_type: &'a str,
    #[dbg(skip)]
    pub data: &'a [u8],
}

#[derive(Dbg, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    #[dbg(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

pub trait Client {
    type Error;
    fn generate(
        &self,
        prompt: &str,
        reference: Option<Reference<'_>>,
    ) -> impl Future<Output = Result<GeneratedImage, Self::Error>>;
}
