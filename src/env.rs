use std::borrow::Cow;

/// A value read from the environment, remembering which key it came from
#[derive(Clone)]
pub struct Secret<T = String> {
    key: Cow<'static, str>,
    value: T,
}

impl<T> Secret<T> {
    pub fn new_key_value(key: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> std::ops::Deref for Secret<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

impl<'de, T> serde::Deserialize<'de> for Secret<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;
        let key = <Cow<'static, str>>::deserialize(deserializer)?;
        let value = std::env::var(&*key)
            .map_err(|_| format!("expected environment variable '{key}' to exist"))
            .map_err(D::Error::custom)?
            .parse()
            .map_err(D::Error::custom)?;
        Ok(Self { key, value })
    }
}

#[doc(inline)]
pub use env_vars::*;

mod env_vars {
    pub trait EnvVar {
        fn key() -> &'static str;
        fn get() -> anyhow::Result<String>;
        fn get_or(default: &str) -> String {
            Self::get().unwrap_or_else(|_| default.to_string())
        }
    }

    fn get_env_var<T: EnvVar>() -> anyhow::Result<String> {
        let key = T::key();
        log::trace!("loading: {key}");
        std::env::var(key).map_err(|_| anyhow::anyhow!("expected '{key}' to exist in env"))
    }

    macro_rules! make_env_key {
        ($($(#[$meta:meta])* $lit:ident)*) => {
            $(
                #[allow(non_camel_case_types)]
                #[derive(Copy, Clone)]
                $(#[$meta])*
                pub struct $lit;

                impl EnvVar for $lit {
                    fn key() -> &'static str { stringify!($lit) }
                    fn get() -> anyhow::Result<String> { get_env_var::<Self>() }
                }
            )*
        };
    }

    make_env_key! {
        /// Bearer token used against the GitHub API (may be empty)
        GISTORY_GITHUB_TOKEN
        /// Base url of the GitHub API
        GISTORY_GITHUB_API_URL
        /// Address the http server listens on
        GISTORY_LISTEN_ADDRESS
        /// Optional path to a yaml configuration
        GISTORY_CONFIG
    }
}
