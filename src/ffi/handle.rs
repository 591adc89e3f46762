//! Shareable ownership of one column's schema and array.
//!
//! A handle is produced when a batch is described without decoding it: each
//! top-level child array is moved out of the batch and parked here together
//! with a private copy of its schema. Clones share the same structs, and the
//! release callbacks run exactly once, either through [`ArrayHandle::release`]
//! or when the last clone is dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::abi::{ArrowArray, ArrowSchema};
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::types::ColumnValue;

struct HandleInner {
    released: AtomicBool,
    slot: Mutex<Option<(ArrowSchema, ArrowArray)>>,
}

#[derive(Clone)]
pub struct ArrayHandle {
    inner: Arc<HandleInner>,
}

impl ArrayHandle {
    /// Takes ownership of an exported schema/array pair.
    pub fn new(schema: ArrowSchema, array: ArrowArray) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                released: AtomicBool::new(false),
                slot: Mutex::new(Some((schema, array))),
            }),
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Runs the release callbacks now. Later calls, from any clone, do nothing.
    pub fn release(&self) {
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let pair = match self.inner.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(pair);
        log::trace!("array handle released");
    }

    /// Runs `f` against the held structs, failing if the handle was released.
    pub fn with_arrays<R>(
        &self,
        f: impl FnOnce(&ArrowSchema, &ArrowArray) -> Result<R, CodecError>,
    ) -> Result<R, CodecError> {
        let guard = self
            .inner
            .slot
            .lock()
            .map_err(|_| CodecError::InternalError("array handle lock poisoned".into()))?;
        match guard.as_ref() {
            Some((schema, array)) => f(schema, array),
            None => Err(CodecError::MalformedArray("array handle has already been released".into())),
        }
    }

    /// Decodes the whole held column.
    pub fn decode(&self) -> Result<ColumnValue, CodecError> {
        self.decode_with_config(&CodecConfig::default())
    }

    pub fn decode_with_config(&self, config: &CodecConfig) -> Result<ColumnValue, CodecError> {
        self.with_arrays(|schema, array| unsafe {
            crate::decoder::decode_column_with_config(schema, array, config)
        })
    }
}

impl PartialEq for ArrayHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayHandle")
            .field("released", &self.is_released())
            .finish()
    }
}
