//! Value encoding strategies.
//!
//! Containers never inspect stored text; they hand values to a [`Coder`]
//! and store whatever text it produces. Keys rely on the encoding being
//! stable: the same logical value must always encode to the same text,
//! because uniqueness is enforced on the encoded bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};

/// Strategy for turning values into storable text and back.
pub trait Coder<T> {
    fn encode(&self, value: &T) -> Result<String>;

    fn decode(&self, text: &str) -> Result<T>;
}

/// Lossless JSON coder backed by serde_json. The default for every container.
///
/// Map types with unordered iteration (e.g. `HashMap`) do not encode
/// repeatably and should not be used as keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCoder;

impl<T> Coder<T> for JsonCoder
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|e| Error::Decode(e.to_string()))
    }
}

type EncodeFn<T> = Box<dyn Fn(&T) -> Result<String> + Send + Sync>;
type DecodeFn<T> = Box<dyn Fn(&str) -> Result<T> + Send + Sync>;

/// Coder built from a pair of caller-supplied functions.
///
/// # Example
///
/// ```
/// use sqlite_object::{Coder, Error, FnCoder};
///
/// let coder = FnCoder::new(
///     |n: &u32| Ok(format!("{n:08}")),
///     |s: &str| s.parse::<u32>().map_err(|e| Error::Decode(e.to_string())),
/// );
/// assert_eq!(coder.encode(&42).unwrap(), "00000042");
/// assert_eq!(coder.decode("00000042").unwrap(), 42);
/// ```
pub struct FnCoder<T> {
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T> FnCoder<T> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<String> + Send + Sync + 'static,
        D: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl<T> Coder<T> for FnCoder<T> {
    fn encode(&self, value: &T) -> Result<String> {
        (self.encode)(value)
    }

    fn decode(&self, text: &str) -> Result<T> {
        (self.decode)(text)
    }
}

impl<T> fmt::Debug for FnCoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCoder").finish_non_exhaustive()
    }
}
