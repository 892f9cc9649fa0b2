macro_rules! make_error {
    ($($(#[$meta:meta])* $ident:ident)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub struct $ident;
            impl std::fmt::Display for $ident {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    std::fmt::Debug::fmt(self, f)
                }
            }
            impl std::error::Error for $ident {}
        )*
    };
}

make_error! {
    /// The gist (or the revision of it) does not exist upstream
    NotFound
}

/// Upstream answered with a status we don't handle
#[derive(Debug)]
pub struct Upstream {
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream responded with {}: {}", self.status, self.body)
    }
}

impl std::error::Error for Upstream {}

/// The client sent something we cannot act on
#[derive(Debug)]
pub struct InvalidRequest(pub String);

impl std::fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidRequest {}
