//! Before/after hooks around computations.
//!
//! Observers are called synchronously, in registration order. A hook that
//! returns an error or panics is logged and skipped; it never changes the
//! outcome of the computation being observed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::TaxError;
use crate::models::{EnkRequest, EnkResult, ExpenseValidationResult, TaxRequest, TaxResult};
use crate::service::orchestrator::EnkStage;

#[derive(Debug, Clone, Copy)]
pub struct PersonalTaxEvent<'a> {
    pub request: &'a TaxRequest,
    pub result: &'a TaxResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct EnkComputationEvent<'a> {
    pub request: &'a EnkRequest,
    /// Empty in the "before" event, fully populated in the "after" event.
    pub result: &'a EnkResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExpenseValidationEvent<'a> {
    pub request: &'a EnkRequest,
    pub result: &'a ExpenseValidationResult,
    pub category_count: usize,
    pub flagged_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ComputationFailedEvent<'a> {
    /// Name of the service operation that failed, e.g. `"compute_enk_tax"`.
    pub operation: &'static str,
    /// Orchestrator stage the failure happened in, for ENK computations.
    pub stage: Option<EnkStage>,
    pub error: &'a TaxError,
    pub timestamp: DateTime<Utc>,
}

/// Receives notifications about computations. Every hook defaults to a no-op.
pub trait ComputationObserver: Send + Sync {
    fn before_personal_tax(
        &self,
        _event: &PersonalTaxEvent<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn after_personal_tax(
        &self,
        _event: &PersonalTaxEvent<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn before_enk_computation(
        &self,
        _event: &EnkComputationEvent<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn after_enk_computation(
        &self,
        _event: &EnkComputationEvent<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn expenses_validated(
        &self,
        _event: &ExpenseValidationEvent<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn computation_failed(
        &self,
        _event: &ComputationFailedEvent<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Registered observers, notified in order with failures isolated.
#[derive(Clone, Default)]
pub(crate) struct ObserverList {
    observers: Vec<Arc<dyn ComputationObserver>>,
}

impl ObserverList {
    pub(crate) fn new(observers: Vec<Arc<dyn ComputationObserver>>) -> Self {
        Self { observers }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn notify<F>(
        &self,
        hook: &'static str,
        call: F,
    ) where
        F: Fn(&dyn ComputationObserver) -> anyhow::Result<()>,
    {
        for (index, observer) in self.observers.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| call(observer.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(hook, observer = index, error = %err, "observer failed; ignoring");
                }
                Err(payload) => {
                    warn!(
                        hook,
                        observer = index,
                        panic = panic_message(payload.as_ref()),
                        "observer panicked; ignoring"
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl ComputationObserver for Counting {
        fn before_personal_tax(
            &self,
            _event: &PersonalTaxEvent<'_>,
        ) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl ComputationObserver for Failing {
        fn before_personal_tax(
            &self,
            _event: &PersonalTaxEvent<'_>,
        ) -> anyhow::Result<()> {
            bail!("audit log unavailable")
        }
    }

    struct Panicking;

    impl ComputationObserver for Panicking {
        fn before_personal_tax(
            &self,
            _event: &PersonalTaxEvent<'_>,
        ) -> anyhow::Result<()> {
            panic!("observer bug")
        }
    }

    fn fire(list: &ObserverList) {
        let request = TaxRequest::default();
        let result = TaxResult::default();
        let event = PersonalTaxEvent {
            request: &request,
            result: &result,
            timestamp: result.computed_at,
        };
        list.notify("before_personal_tax", |observer| {
            observer.before_personal_tax(&event)
        });
    }

    #[test]
    fn failing_and_panicking_observers_do_not_stop_later_ones() {
        let counting = Arc::new(Counting::default());
        let list = ObserverList::new(vec![
            Arc::new(Failing),
            Arc::new(Panicking),
            counting.clone(),
        ]);

        fire(&list);
        fire(&list);

        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let list = ObserverList::default();

        fire(&list);

        assert_eq!(list.len(), 0);
    }

    #[test]
    fn panic_message_extracts_strings() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
