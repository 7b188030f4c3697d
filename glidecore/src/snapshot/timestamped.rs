//! Values that remember when they were last refreshed.

/// A value plus the monotonic clock reading of its last update.
///
/// A field that has not been updated since construction or since
/// [`clear`](Self::clear) is never valid. The stored value survives
/// invalidation (it can still be inspected via [`raw`](Self::raw)) but
/// [`get`](Self::get) hides it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timestamped<T> {
    value: T,
    stamp: Option<f64>,
}

impl<T> Timestamped<T> {
    /// An invalid field holding `value`.
    pub const fn invalid(value: T) -> Self {
        Self { value, stamp: None }
    }

    /// A field holding `value`, fresh at `clock`.
    pub const fn fresh(value: T, clock: f64) -> Self {
        Self {
            value,
            stamp: Some(clock),
        }
    }

    /// Store a new value and mark it fresh at `clock`.
    pub fn set(&mut self, value: T, clock: f64) {
        self.value = value;
        self.stamp = Some(clock);
    }

    /// Mark the current value fresh at `clock`.
    pub fn update(&mut self, clock: f64) {
        self.stamp = Some(clock);
    }

    /// Mark the value invalid.
    pub fn clear(&mut self) {
        self.stamp = None;
    }

    /// Invalidate the value if it is older than `max_age` seconds at
    /// `clock`, or if `clock` lies before the last update.
    ///
    /// Returns `true` if this call invalidated the value.
    pub fn expire(&mut self, clock: f64, max_age: f64) -> bool {
        match self.stamp {
            Some(stamp) if clock < stamp || clock - stamp > max_age => {
                self.stamp = None;
                true
            }
            _ => false,
        }
    }

    /// Whether the value has been refreshed and not since invalidated.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.stamp.is_some()
    }

    /// The value, if valid.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.stamp.map(|_| &self.value)
    }

    /// The stored value regardless of validity.
    #[inline]
    pub fn raw(&self) -> &T {
        &self.value
    }

    /// Clock reading of the last update, if valid.
    #[inline]
    pub fn stamp(&self) -> Option<f64> {
        self.stamp
    }

    /// Move the update stamp by `offset` seconds, e.g. onto another clock.
    pub fn shift(&mut self, offset: f64) {
        if let Some(stamp) = self.stamp.as_mut() {
            *stamp += offset;
        }
    }

    /// Age in seconds at `clock`, if valid.
    pub fn age(&self, clock: f64) -> Option<f64> {
        self.stamp.map(|stamp| clock - stamp)
    }

    /// Whether this value was refreshed after `other`.
    ///
    /// A valid value is newer than an invalid one; an invalid value is
    /// never newer than anything.
    pub fn is_newer_than<U>(&self, other: &Timestamped<U>) -> bool {
        match (self.stamp, other.stamp) {
            (Some(mine), Some(theirs)) => mine > theirs,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl<T: Copy> Timestamped<T> {
    /// The value by copy, if valid.
    #[inline]
    pub fn value(&self) -> Option<T> {
        self.stamp.map(|_| self.value)
    }
}

impl<T: Clone> Timestamped<T> {
    /// Fill this field from `other` if this one is invalid and `other` is
    /// valid. Returns `true` if the value was taken over.
    pub fn complement(&mut self, other: &Timestamped<T>) -> bool {
        if !self.is_valid() && other.is_valid() {
            *self = other.clone();
            true
        } else {
            false
        }
    }
}
