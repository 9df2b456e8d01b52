//! Race-safe argument capture and message formatting
//!
//! Producer threads hand arguments to the logger by reference; the records
//! they end up in may be encoded much later on the pipeline worker. Capture
//! therefore snapshots every argument into an owned [`SafeValue`] on the
//! calling thread, degrading rather than blocking or panicking when a value
//! cannot be read safely (a contended shared map, an unprintable handle, a
//! structure nested past the depth guard).

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};

/// Nesting limit for recursive capture; deeper values degrade to `Opaque`.
pub const MAX_SAFE_DEPTH: usize = 8;

/// Sequences up to this length are copied element-wise; longer ones are
/// summarized as `[N items of T]`.
pub const SEQ_COPY_LIMIT: usize = 10;

/// Owned snapshot of a log argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SafeValue {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<SafeValue>),
    /// A sequence too long to copy: length and element type name
    SeqSummary { len: usize, elem: &'static str },
    /// A keyed collection, described without touching its entries.
    /// `len: None` means the collection was contended at capture time.
    Map {
        type_name: &'static str,
        len: Option<usize>,
    },
    /// A structured value rendered field by field
    Record {
        type_name: &'static str,
        fields: Vec<(&'static str, SafeValue)>,
    },
    /// A value with no safe rendition; only its type name survives
    Opaque(&'static str),
}

impl SafeValue {
    /// Build a record snapshot, dropping fields holding zero/default values
    /// so quiet structs render compactly.
    pub fn record(type_name: &'static str, fields: Vec<(&'static str, SafeValue)>) -> SafeValue {
        SafeValue::Record {
            type_name,
            fields: fields
                .into_iter()
                .filter(|(_, value)| !value.is_default())
                .collect(),
        }
    }

    fn is_default(&self) -> bool {
        match self {
            SafeValue::Nil => true,
            SafeValue::Bool(b) => !b,
            SafeValue::Int(i) => *i == 0,
            SafeValue::Uint(u) => *u == 0,
            SafeValue::Float(x) => *x == 0.0,
            SafeValue::Str(s) => s.is_empty(),
            SafeValue::Bytes(b) => b.is_empty(),
            SafeValue::Seq(items) => items.is_empty(),
            _ => false,
        }
    }

    /// True for the degraded variants (summaries, opaque handles, contended
    /// maps) that count toward [`SerializerStats::degraded`].
    fn is_degraded(&self) -> bool {
        matches!(
            self,
            SafeValue::SeqSummary { .. }
                | SafeValue::Map { len: None, .. }
                | SafeValue::Opaque(_)
        )
    }
}

impl fmt::Display for SafeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeValue::Nil => write!(f, "nil"),
            SafeValue::Bool(b) => write!(f, "{}", b),
            SafeValue::Int(i) => write!(f, "{}", i),
            SafeValue::Uint(u) => write!(f, "{}", u),
            SafeValue::Float(x) => write!(f, "{}", x),
            SafeValue::Str(s) => write!(f, "{}", s),
            SafeValue::Bytes(b) => write!(f, "{} bytes", b.len()),
            SafeValue::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            SafeValue::SeqSummary { len, elem } => write!(f, "[{} items of {}]", len, elem),
            SafeValue::Map {
                type_name,
                len: Some(len),
            } => write!(f, "{}{{len={}}}", type_name, len),
            SafeValue::Map {
                type_name,
                len: None,
            } => write!(f, "{}{{concurrent}}", type_name),
            SafeValue::Record { type_name, fields } => {
                write!(f, "{}{{", type_name)?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
            SafeValue::Opaque(type_name) => write!(f, "<{}>", type_name),
        }
    }
}

/// A value the logger can snapshot on the producer thread.
///
/// Implementations must never panic and never block: shared state is probed
/// with try-lock semantics and summarized when unavailable.
pub trait SafeArg {
    fn capture(&self, depth: usize) -> SafeValue;
}

macro_rules! impl_safe_int {
    ($($t:ty),*) => {
        $(impl SafeArg for $t {
            fn capture(&self, _depth: usize) -> SafeValue {
                SafeValue::Int(i64::from(*self))
            }
        })*
    };
}

macro_rules! impl_safe_uint {
    ($($t:ty),*) => {
        $(impl SafeArg for $t {
            fn capture(&self, _depth: usize) -> SafeValue {
                SafeValue::Uint(u64::from(*self))
            }
        })*
    };
}

impl_safe_int!(i8, i16, i32, i64);
impl_safe_uint!(u8, u16, u32, u64);

impl SafeArg for isize {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Int(*self as i64)
    }
}

impl SafeArg for usize {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Uint(*self as u64)
    }
}

impl SafeArg for f32 {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Float(f64::from(*self))
    }
}

impl SafeArg for f64 {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Float(*self)
    }
}

impl SafeArg for bool {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Bool(*self)
    }
}

impl SafeArg for str {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Str(self.to_string())
    }
}

impl SafeArg for &str {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Str((*self).to_string())
    }
}

impl SafeArg for String {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Str(self.clone())
    }
}

impl<T: SafeArg> SafeArg for Option<T> {
    fn capture(&self, depth: usize) -> SafeValue {
        if depth >= MAX_SAFE_DEPTH {
            return SafeValue::Opaque("Option");
        }
        match self {
            Some(inner) => inner.capture(depth + 1),
            None => SafeValue::Nil,
        }
    }
}

impl<T: SafeArg> SafeArg for &T {
    fn capture(&self, depth: usize) -> SafeValue {
        (**self).capture(depth)
    }
}

fn capture_slice<T: SafeArg>(items: &[T], depth: usize) -> SafeValue {
    if depth >= MAX_SAFE_DEPTH {
        return SafeValue::Opaque("slice");
    }
    if items.len() > SEQ_COPY_LIMIT {
        return SafeValue::SeqSummary {
            len: items.len(),
            elem: std::any::type_name::<T>(),
        };
    }
    SafeValue::Seq(items.iter().map(|item| item.capture(depth + 1)).collect())
}

impl<T: SafeArg> SafeArg for [T] {
    fn capture(&self, depth: usize) -> SafeValue {
        capture_slice(self, depth)
    }
}

impl<T: SafeArg> SafeArg for Vec<T> {
    fn capture(&self, depth: usize) -> SafeValue {
        capture_slice(self, depth)
    }
}

impl<T: SafeArg, const N: usize> SafeArg for [T; N] {
    fn capture(&self, depth: usize) -> SafeValue {
        capture_slice(self, depth)
    }
}

/// Owned byte-payload wrapper; captures the bytes themselves rather than a
/// sequence of numbers.
pub struct SafeBytes(pub Vec<u8>);

impl SafeArg for SafeBytes {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Bytes(self.0.clone())
    }
}

// Unshared maps are safe to measure but their entries may themselves hold
// non-capturable values, so only the length is taken.
impl<K, V, S> SafeArg for HashMap<K, V, S> {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Map {
            type_name: "HashMap",
            len: Some(self.len()),
        }
    }
}

impl<K, V> SafeArg for BTreeMap<K, V> {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Map {
            type_name: "BTreeMap",
            len: Some(self.len()),
        }
    }
}

// Shared maps are probed without blocking. A writer holding the lock at
// capture time yields the contended form instead of stalling the log call.
impl<K, V, S> SafeArg for std::sync::Mutex<HashMap<K, V, S>> {
    fn capture(&self, _depth: usize) -> SafeValue {
        match self.try_lock() {
            Ok(guard) => SafeValue::Map {
                type_name: "HashMap",
                len: Some(guard.len()),
            },
            Err(std::sync::TryLockError::Poisoned(poisoned)) => SafeValue::Map {
                type_name: "HashMap",
                len: Some(poisoned.into_inner().len()),
            },
            Err(std::sync::TryLockError::WouldBlock) => SafeValue::Map {
                type_name: "HashMap",
                len: None,
            },
        }
    }
}

impl<K, V, S> SafeArg for parking_lot::Mutex<HashMap<K, V, S>> {
    fn capture(&self, _depth: usize) -> SafeValue {
        match self.try_lock() {
            Some(guard) => SafeValue::Map {
                type_name: "HashMap",
                len: Some(guard.len()),
            },
            None => SafeValue::Map {
                type_name: "HashMap",
                len: None,
            },
        }
    }
}

impl<K, V, S> SafeArg for parking_lot::RwLock<HashMap<K, V, S>> {
    fn capture(&self, _depth: usize) -> SafeValue {
        match self.try_read() {
            Some(guard) => SafeValue::Map {
                type_name: "HashMap",
                len: Some(guard.len()),
            },
            None => SafeValue::Map {
                type_name: "HashMap",
                len: None,
            },
        }
    }
}

/// Wrapper for logging any error by its rendered description.
pub struct SafeErr<'a, E: std::error::Error>(pub &'a E);

impl<E: std::error::Error> SafeArg for SafeErr<'_, E> {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Str(self.0.to_string())
    }
}

impl SafeArg for std::io::Error {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Str(self.to_string())
    }
}

// Channel endpoints carry no printable payload.
impl<T> SafeArg for crossbeam_channel::Sender<T> {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Opaque("Sender")
    }
}

impl<T> SafeArg for crossbeam_channel::Receiver<T> {
    fn capture(&self, _depth: usize) -> SafeValue {
        SafeValue::Opaque("Receiver")
    }
}

/// Capture counters, readable while the logger runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerStats {
    pub captured: u64,
    pub degraded: u64,
}

/// Fills `{}` placeholders in a message with captured argument snapshots.
#[derive(Debug, Default)]
pub struct SafeFormatter {
    captured: AtomicU64,
    degraded: AtomicU64,
}

impl SafeFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a single argument, counting the capture.
    pub fn capture(&self, arg: &dyn SafeArg) -> SafeValue {
        let value = arg.capture(0);
        self.captured.fetch_add(1, Ordering::Relaxed);
        if value.is_degraded() {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Render `template` with `{}` placeholders substituted in order.
    ///
    /// `{{` and `}}` escape to literal braces. Placeholders beyond the
    /// argument list stay literal; surplus arguments are appended
    /// space-separated after the message.
    pub fn format(&self, template: &str, args: &[&dyn SafeArg]) -> String {
        let values: Vec<SafeValue> = args.iter().map(|arg| self.capture(*arg)).collect();
        let mut out = String::with_capacity(template.len() + values.len() * 8);
        let mut next = 0usize;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' if chars.peek() == Some(&'}') => {
                    chars.next();
                    if next < values.len() {
                        let _ = write!(out, "{}", values[next]);
                        next += 1;
                    } else {
                        out.push_str("{}");
                    }
                }
                _ => out.push(c),
            }
        }

        for value in &values[next.min(values.len())..] {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{}", value);
        }
        out
    }

    pub fn stats(&self) -> SerializerStats {
        SerializerStats {
            captured: self.captured.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_capture() {
        let fmt = SafeFormatter::new();
        assert_eq!(fmt.capture(&42i32), SafeValue::Int(42));
        assert_eq!(fmt.capture(&7u64), SafeValue::Uint(7));
        assert_eq!(fmt.capture(&true), SafeValue::Bool(true));
        assert_eq!(fmt.capture(&"hi"), SafeValue::Str("hi".to_string()));
        assert_eq!(fmt.capture(&None::<i32>), SafeValue::Nil);
    }

    #[test]
    fn test_short_sequence_copied() {
        let fmt = SafeFormatter::new();
        let v = vec![1i32, 2, 3];
        assert_eq!(
            fmt.capture(&v),
            SafeValue::Seq(vec![
                SafeValue::Int(1),
                SafeValue::Int(2),
                SafeValue::Int(3)
            ])
        );
    }

    #[test]
    fn test_long_sequence_summarized() {
        let fmt = SafeFormatter::new();
        let v: Vec<u32> = (0..50).collect();
        match fmt.capture(&v) {
            SafeValue::SeqSummary { len, .. } => assert_eq!(len, 50),
            other => panic!("expected summary, got {:?}", other),
        }
        assert_eq!(fmt.stats().degraded, 1);
    }

    #[test]
    fn test_map_len_only() {
        let fmt = SafeFormatter::new();
        let mut map = HashMap::new();
        map.insert("a", vec![1u8]);
        map.insert("b", vec![2u8]);
        assert_eq!(
            fmt.capture(&map),
            SafeValue::Map {
                type_name: "HashMap",
                len: Some(2)
            }
        );
    }

    #[test]
    fn test_contended_mutex_map() {
        let fmt = SafeFormatter::new();
        let shared: std::sync::Mutex<HashMap<String, i32>> = std::sync::Mutex::new(HashMap::new());

        let _guard = shared.lock().unwrap();
        let value = fmt.capture(&shared);
        assert_eq!(
            value,
            SafeValue::Map {
                type_name: "HashMap",
                len: None
            }
        );
        assert_eq!(value.to_string(), "HashMap{concurrent}");
    }

    #[test]
    fn test_parking_lot_rwlock_map() {
        let fmt = SafeFormatter::new();
        let shared: parking_lot::RwLock<HashMap<u8, u8>> = parking_lot::RwLock::new(HashMap::new());
        shared.write().insert(1, 1);
        assert_eq!(
            fmt.capture(&shared),
            SafeValue::Map {
                type_name: "HashMap",
                len: Some(1)
            }
        );

        let _writer = shared.write();
        assert_eq!(
            fmt.capture(&shared),
            SafeValue::Map {
                type_name: "HashMap",
                len: None
            }
        );
    }

    #[test]
    fn test_depth_guard() {
        let fmt = SafeFormatter::new();
        // nested options recurse one level per layer
        let deep = Some(Some(Some(Some(Some(Some(Some(Some(Some(1i32)))))))));
        assert_eq!(fmt.capture(&deep), SafeValue::Opaque("Option"));
    }

    #[test]
    fn test_channel_opaque() {
        let fmt = SafeFormatter::new();
        let (tx, rx) = crossbeam_channel::bounded::<u8>(1);
        assert_eq!(fmt.capture(&tx), SafeValue::Opaque("Sender"));
        assert_eq!(fmt.capture(&rx), SafeValue::Opaque("Receiver"));
        assert_eq!(fmt.capture(&tx).to_string(), "<Sender>");
    }

    #[test]
    fn test_format_placeholders() {
        let fmt = SafeFormatter::new();
        let msg = fmt.format("user {} logged in from {}", &[&42i32, &"10.0.0.1"]);
        assert_eq!(msg, "user 42 logged in from 10.0.0.1");
    }

    #[test]
    fn test_format_escaped_braces() {
        let fmt = SafeFormatter::new();
        let msg = fmt.format("literal {{}} and {}", &[&1i32]);
        assert_eq!(msg, "literal {} and 1");
    }

    #[test]
    fn test_format_missing_args_stay_literal() {
        let fmt = SafeFormatter::new();
        let msg = fmt.format("a={} b={}", &[&1i32]);
        assert_eq!(msg, "a=1 b={}");
    }

    #[test]
    fn test_format_surplus_args_appended() {
        let fmt = SafeFormatter::new();
        let msg = fmt.format("ready", &[&1i32, &"extra"]);
        assert_eq!(msg, "ready 1 extra");
    }

    #[test]
    fn test_bytes_and_btreemap() {
        let fmt = SafeFormatter::new();
        let payload = SafeBytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(fmt.capture(&payload).to_string(), "4 bytes");

        let mut map = BTreeMap::new();
        map.insert(1u8, "one");
        assert_eq!(fmt.capture(&map).to_string(), "BTreeMap{len=1}");
    }

    #[test]
    fn test_safe_err_wrapper() {
        let fmt = SafeFormatter::new();
        let err = crate::core::error::LoggerError::queue_full(16);
        let msg = fmt.format("submit failed: {}", &[&SafeErr(&err)]);
        assert_eq!(msg, "submit failed: Log queue full: 16 events buffered");
    }

    #[test]
    fn test_error_capture() {
        let fmt = SafeFormatter::new();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        match fmt.capture(&err) {
            SafeValue::Str(text) => assert!(text.contains("gone")),
            other => panic!("expected string, got {:?}", other),
        }
    }

    struct ConnState {
        peer: String,
        retries: u32,
        draining: bool,
    }

    impl SafeArg for ConnState {
        fn capture(&self, depth: usize) -> SafeValue {
            if depth >= MAX_SAFE_DEPTH {
                return SafeValue::Opaque("ConnState");
            }
            SafeValue::record(
                "ConnState",
                vec![
                    ("peer", self.peer.capture(depth + 1)),
                    ("retries", self.retries.capture(depth + 1)),
                    ("draining", self.draining.capture(depth + 1)),
                ],
            )
        }
    }

    #[test]
    fn test_record_skips_default_fields() {
        let fmt = SafeFormatter::new();
        let state = ConnState {
            peer: "10.0.0.9:6379".to_string(),
            retries: 0,
            draining: false,
        };
        let value = fmt.capture(&state);
        assert_eq!(value.to_string(), "ConnState{peer=10.0.0.9:6379}");

        let busy = ConnState {
            peer: String::new(),
            retries: 3,
            draining: true,
        };
        assert_eq!(
            fmt.capture(&busy).to_string(),
            "ConnState{retries=3 draining=true}"
        );
    }
}
