//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn sections(&self) -> Vec<String>;

    fn keys(&self, section: &str) -> Vec<String>;
}
