use crate::classify::Annotations;

pub trait Client {
    type Error;
    fn annotate(&self, image: &[u8]) -> impl Future<Output = Result<Annotations, Self::Error>>;
}
