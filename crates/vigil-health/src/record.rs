//! Per-invocation monitoring records
//!
//! A [`TestRecord`] is produced by running one service call or one diagnostic
//! test. Running never fails: errors and panics from the wrapped work end up
//! in the record, and failures from the service's post-call hooks are dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use vigil_core::{DiagnosticTest, Error, Result, Service, ServiceConfiguration};

/// The thing a record was produced from
#[derive(Debug, Clone)]
pub enum Subject {
    /// A wrapped service call
    Service(Arc<dyn Service>),
    /// A self-contained diagnostic test
    Test(Arc<dyn DiagnosticTest>),
}

impl Subject {
    /// Monitoring configuration, if the subject has one
    pub fn configuration(&self) -> Option<&ServiceConfiguration> {
        match self {
            Subject::Service(service) => Some(service.configuration()),
            Subject::Test(_) => None,
        }
    }
}

/// Outcome and timing of one monitored invocation
#[derive(Debug)]
pub struct TestRecord {
    start: Option<f64>,
    end: Option<f64>,
    duration: Option<f64>,
    working: Option<bool>,
    exception: Option<Error>,
    identifier: String,
    subject: Subject,
}

/// Wall-clock time in seconds since the UNIX epoch
pub(crate) fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Run `f`, turning a panic into an [`Error::Panic`]
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Error::from_panic(payload)))
}

impl TestRecord {
    fn unset(identifier: String, subject: Subject) -> Self {
        Self {
            start: None,
            end: None,
            duration: None,
            working: None,
            exception: None,
            identifier,
            subject,
        }
    }

    /// Call `method` on `service` and record the outcome.
    ///
    /// When the service is not monitored the call is skipped and only the
    /// identifier is filled in.
    pub fn run_service(service: Arc<dyn Service>, method: &str) -> Self {
        let identifier = service.configuration().identifier().to_string();
        let mut record = Self::unset(identifier, Subject::Service(Arc::clone(&service)));

        if !service.configuration().is_monitored() {
            debug!(service = %record.identifier, method, "Service not monitored, skipping call");
            return record;
        }

        let start = now();
        let outcome = guarded(|| {
            service.pre_call(method)?;
            service.call(method)
        });
        let (response, exception) = match outcome {
            Ok(response) => (Some(response), None),
            Err(e) => (None, Some(e)),
        };
        let end = now();

        let hooks = guarded(|| {
            service.set_start(start);
            service.set_end(end);
            service.post_call(response.as_ref(), None, exception.as_ref())
        });
        if let Err(e) = hooks {
            debug!(service = %record.identifier, error = %e, "Discarded post-call hook failure");
        }

        match &exception {
            None => debug!(service = %record.identifier, method, "Service call succeeded"),
            Some(e) => {
                warn!(service = %record.identifier, method, error = %e, "Service call failed")
            }
        }

        record.start = Some(start);
        record.end = Some(end);
        record.duration = Some(end - start);
        record.working = Some(exception.is_none());
        record.exception = exception;
        record
    }

    /// Execute `test` and record the outcome
    pub fn run_test(test: Arc<dyn DiagnosticTest>) -> Self {
        let start = now();
        let outcome = guarded(|| test.execute());
        let end = now();

        let identifier = test.identifier().to_string();
        let mut record = Self::unset(identifier, Subject::Test(test));

        match outcome {
            Ok(()) => {
                debug!(test = %record.identifier, "Diagnostic test passed");
                record.working = Some(true);
            }
            Err(e) => {
                warn!(test = %record.identifier, error = %e, "Diagnostic test failed");
                record.working = Some(false);
                record.exception = Some(e);
            }
        }

        record.start = Some(start);
        record.end = Some(end);
        record.duration = Some(end - start);
        record
    }

    /// Start timestamp, unset when the call was skipped
    pub fn start(&self) -> Option<f64> {
        self.start
    }

    /// End timestamp, unset when the call was skipped
    pub fn end(&self) -> Option<f64> {
        self.end
    }

    /// `end - start`, unset when the call was skipped
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// `Some(true)` when the wrapped work completed without error
    pub fn working(&self) -> Option<bool> {
        self.working
    }

    /// Whether the wrapped work is known to have succeeded
    pub fn is_working(&self) -> bool {
        self.working == Some(true)
    }

    /// Error captured from the wrapped work
    pub fn exception(&self) -> Option<&Error> {
        self.exception.as_ref()
    }

    /// Report label
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// What the record was produced from
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// The wrapped service, if any
    pub fn service(&self) -> Option<&Arc<dyn Service>> {
        match &self.subject {
            Subject::Service(service) => Some(service),
            Subject::Test(_) => None,
        }
    }

    /// The diagnostic test, if any
    pub fn test(&self) -> Option<&Arc<dyn DiagnosticTest>> {
        match &self.subject {
            Subject::Test(test) => Some(test),
            Subject::Service(_) => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vigil_core::Response;

    /// Configurable fake service
    #[derive(Debug)]
    pub(crate) struct FakeService {
        pub(crate) configuration: ServiceConfiguration,
        pub(crate) fail_with: Option<&'static str>,
        pub(crate) fail_pre_call: Option<&'static str>,
        pub(crate) panic_in_call: bool,
        pub(crate) fail_post_call: bool,
        pub(crate) panic_in_post_call: bool,
        pub(crate) calls: AtomicUsize,
        pub(crate) timing: Mutex<(Option<f64>, Option<f64>)>,
        pub(crate) post_call_error: Mutex<Option<String>>,
    }

    impl FakeService {
        pub(crate) fn new(configuration: ServiceConfiguration) -> Self {
            Self {
                configuration,
                fail_with: None,
                fail_pre_call: None,
                panic_in_call: false,
                fail_post_call: false,
                panic_in_post_call: false,
                calls: AtomicUsize::new(0),
                timing: Mutex::new((None, None)),
                post_call_error: Mutex::new(None),
            }
        }

        pub(crate) fn failing(configuration: ServiceConfiguration, message: &'static str) -> Self {
            Self {
                fail_with: Some(message),
                ..Self::new(configuration)
            }
        }
    }

    impl Service for FakeService {
        fn configuration(&self) -> &ServiceConfiguration {
            &self.configuration
        }

        fn pre_call(&self, _method: &str) -> Result<()> {
            match self.fail_pre_call {
                Some(message) => Err(Error::failed(message)),
                None => Ok(()),
            }
        }

        fn call(&self, method: &str) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_in_call {
                panic!("service exploded");
            }
            match self.fail_with {
                Some(message) => Err(Error::failed(message)),
                None => Ok(serde_json::json!({ "method": method })),
            }
        }

        fn set_start(&self, start: f64) {
            self.timing.lock().0 = Some(start);
        }

        fn set_end(&self, end: f64) {
            self.timing.lock().1 = Some(end);
        }

        fn post_call(
            &self,
            _response: Option<&Response>,
            _extra: Option<&Response>,
            error: Option<&Error>,
        ) -> Result<()> {
            *self.post_call_error.lock() = error.map(|e| e.to_string());
            if self.panic_in_post_call {
                panic!("post-call hook exploded");
            }
            if self.fail_post_call {
                return Err(Error::failed("post-call hook failed"));
            }
            Ok(())
        }
    }

    /// Fake diagnostic test
    #[derive(Debug)]
    pub(crate) struct FakeTest {
        pub(crate) identifier: String,
        pub(crate) fail_with: Option<&'static str>,
    }

    impl DiagnosticTest for FakeTest {
        fn execute(&self) -> Result<()> {
            match self.fail_with {
                Some(message) => Err(Error::failed(message)),
                None => Ok(()),
            }
        }

        fn identifier(&self) -> &str {
            &self.identifier
        }
    }

    #[derive(Debug)]
    struct PanickingTest;

    impl DiagnosticTest for PanickingTest {
        fn execute(&self) -> Result<()> {
            panic!("diagnostic exploded");
        }

        fn identifier(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_successful_service_call() {
        let service = Arc::new(FakeService::new(ServiceConfiguration::new("IDENTIFIER")));
        let record = TestRecord::run_service(service.clone(), "monitor");

        assert_eq!(record.identifier(), "IDENTIFIER");
        assert_eq!(record.working(), Some(true));
        assert!(record.exception().is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let (start, end) = (record.start().unwrap(), record.end().unwrap());
        assert_eq!(record.duration(), Some(end - start));
        assert!(end >= start);

        // hooks received the same timestamps
        assert_eq!(*service.timing.lock(), (Some(start), Some(end)));
        assert!(record.service().is_some());
        assert!(record.test().is_none());
    }

    #[test]
    fn test_failing_service_call() {
        let service = Arc::new(FakeService::failing(ServiceConfiguration::new("ldap"), "boom"));
        let record = TestRecord::run_service(service.clone(), "bind");

        assert_eq!(record.working(), Some(false));
        assert_eq!(record.exception().unwrap().to_string(), "boom");
        assert_eq!(service.post_call_error.lock().as_deref(), Some("boom"));
        assert_eq!(
            record.duration(),
            Some(record.end().unwrap() - record.start().unwrap())
        );
    }

    #[test]
    fn test_unmonitored_service_is_not_called() {
        let configuration = ServiceConfiguration::new("legacy").with_monitored(false);
        let service = Arc::new(FakeService::new(configuration));
        let record = TestRecord::run_service(service.clone(), "monitor");

        assert_eq!(record.identifier(), "legacy");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(record.start().is_none());
        assert!(record.end().is_none());
        assert!(record.duration().is_none());
        assert!(record.working().is_none());
        assert!(record.exception().is_none());
    }

    #[test]
    fn test_post_call_failure_keeps_outcome() {
        let mut service = FakeService::new(ServiceConfiguration::new("cache"));
        service.fail_post_call = true;
        let record = TestRecord::run_service(Arc::new(service), "get");

        assert_eq!(record.working(), Some(true));
        assert!(record.exception().is_none());

        let mut service = FakeService::failing(ServiceConfiguration::new("cache"), "miss");
        service.fail_post_call = true;
        let record = TestRecord::run_service(Arc::new(service), "get");

        assert_eq!(record.working(), Some(false));
        assert_eq!(record.exception().unwrap().to_string(), "miss");
    }

    #[test]
    fn test_panicking_service_call_is_captured() {
        let mut service = FakeService::new(ServiceConfiguration::new("flaky"));
        service.panic_in_call = true;
        let record = TestRecord::run_service(Arc::new(service), "monitor");

        assert_eq!(record.working(), Some(false));
        assert!(matches!(record.exception(), Some(Error::Panic(_))));
    }

    #[test]
    fn test_run_test() {
        let test = Arc::new(FakeTest {
            identifier: "disk".to_string(),
            fail_with: None,
        });
        let record = TestRecord::run_test(test);
        assert!(record.is_working());
        assert_eq!(record.identifier(), "disk");
        assert!(record.subject().configuration().is_none());
        assert!(record.test().is_some());

        let test = Arc::new(FakeTest {
            identifier: "env".to_string(),
            fail_with: Some("TEST is not set"),
        });
        let record = TestRecord::run_test(test);
        assert_eq!(record.working(), Some(false));
        assert!(record.exception().is_some());
        assert_eq!(
            record.duration(),
            Some(record.end().unwrap() - record.start().unwrap())
        );
    }

    #[test]
    fn test_panicking_post_call_keeps_outcome() {
        let mut service = FakeService::new(ServiceConfiguration::new("queue"));
        service.panic_in_post_call = true;
        let service = Arc::new(service);
        let record = TestRecord::run_service(service.clone(), "publish");

        assert_eq!(record.working(), Some(true));
        assert!(record.exception().is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let mut service = FakeService::failing(ServiceConfiguration::new("queue"), "full");
        service.panic_in_post_call = true;
        let record = TestRecord::run_service(Arc::new(service), "publish");

        assert_eq!(record.working(), Some(false));
        assert_eq!(record.exception().unwrap().to_string(), "full");
    }

    #[test]
    fn test_panicking_diagnostic_test_is_captured() {
        let record = TestRecord::run_test(Arc::new(PanickingTest));

        assert_eq!(record.identifier(), "panicking");
        assert_eq!(record.working(), Some(false));
        assert!(matches!(record.exception(), Some(Error::Panic(_))));
        assert!(record.exception().unwrap().to_string().contains("diagnostic exploded"));
        assert!(record.duration().is_some());
    }

    #[test]
    fn test_pre_call_failure_skips_call() {
        let mut service = FakeService::new(ServiceConfiguration::new("auth"));
        service.fail_pre_call = Some("not connected");
        let service = Arc::new(service);
        let record = TestRecord::run_service(service.clone(), "login");

        assert_eq!(record.working(), Some(false));
        assert_eq!(record.exception().unwrap().to_string(), "not connected");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.post_call_error.lock().as_deref(), Some("not connected"));
        assert!(record.duration().is_some());
    }
}
