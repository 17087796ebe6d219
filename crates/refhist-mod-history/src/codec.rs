/// Snapshot codecs.
///
/// A codec turns the live value into something that can sit on a history
/// stack without being affected by later changes to the value, and turns
/// it back when the history is navigated.
///
/// `Serialized` pairs are a caller contract: `parse` must be the lossless
/// inverse of `dump` for every value ever captured. Nothing checks this; a
/// lossy pair restores wrong values without any error.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts between a live value `T` and its stored snapshot `S`.
pub trait SnapshotCodec<T, S> {
    /// Produces an isolated snapshot of `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as a snapshot.
    fn capture(&self, value: &T) -> Result<S>;

    /// Rebuilds a live value from `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be decoded.
    fn restore(&self, snapshot: &S) -> Result<T>;
}

/// Stores the value as-is, using `Clone`.
///
/// For owned data this already yields independent snapshots. Values that
/// hold shared pointers (`Rc<RefCell<_>>`) will alias; use [`CloneWith`]
/// or [`JsonClone`] for those.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T: Clone> SnapshotCodec<T, T> for Identity {
    fn capture(&self, value: &T) -> Result<T> {
        Ok(value.clone())
    }

    fn restore(&self, snapshot: &T) -> Result<T> {
        Ok(snapshot.clone())
    }
}

/// Deep-copies with a caller-supplied function on both capture and restore.
pub struct CloneWith<F>(pub F);

impl<F> std::fmt::Debug for CloneWith<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CloneWith(..)")
    }
}

impl<T, F> SnapshotCodec<T, T> for CloneWith<F>
where
    F: Fn(&T) -> T,
{
    fn capture(&self, value: &T) -> Result<T> {
        Ok((self.0)(value))
    }

    fn restore(&self, snapshot: &T) -> Result<T> {
        Ok((self.0)(snapshot))
    }
}

/// Deep-copies through a `serde_json` round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonClone;

impl<T> SnapshotCodec<T, T> for JsonClone
where
    T: Serialize + DeserializeOwned,
{
    fn capture(&self, value: &T) -> Result<T> {
        json_round_trip(value)
    }

    fn restore(&self, snapshot: &T) -> Result<T> {
        json_round_trip(snapshot)
    }
}

fn json_round_trip<T: Serialize + DeserializeOwned>(value: &T) -> Result<T> {
    let json = serde_json::to_value(value).context("Failed to serialize value for cloning")?;
    serde_json::from_value(json).context("Failed to deserialize cloned value")
}

/// Stores whatever `dump` returns and rebuilds the value with `parse`.
pub struct Serialized<D, P> {
    dump: D,
    parse: P,
}

impl<D, P> Serialized<D, P> {
    pub fn new(dump: D, parse: P) -> Self {
        Self { dump, parse }
    }
}

impl<D, P> std::fmt::Debug for Serialized<D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Serialized(..)")
    }
}

impl<T, S, D, P> SnapshotCodec<T, S> for Serialized<D, P>
where
    D: Fn(&T) -> S,
    P: Fn(&S) -> T,
{
    fn capture(&self, value: &T) -> Result<S> {
        Ok((self.dump)(value))
    }

    fn restore(&self, snapshot: &S) -> Result<T> {
        Ok((self.parse)(snapshot))
    }
}

/// Stores snapshots as compact JSON strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonString;

impl<T> SnapshotCodec<T, String> for JsonString
where
    T: Serialize + DeserializeOwned,
{
    fn capture(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).context("Failed to serialize snapshot")
    }

    fn restore(&self, snapshot: &String) -> Result<T> {
        serde_json::from_str(snapshot).context("Failed to parse snapshot")
    }
}
