use anyhow::anyhow;

/// Whether a faked driven port should behave as if its backing service is reachable
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Fails the way a real adapter would when its backing service is down
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not connect to service!")),
        }
    }
}

/// Records the arguments a mocked function was called with and hands back a canned result.
/// Hand-rolled because the usual mocking crates don't cope with `async fn` in traits.
///
/// A mock driving port typically wraps its fields in a [std::sync::Mutex] so calls through
/// `&self` can record arguments:
///
/// ```ignore
/// impl SomePort for Mutex<MockSomeService> {
///     async fn do_thing(&self, id: i32) -> Result<Outcome<()>, SomeError> {
///         let mut locked_self = self.lock().expect("mock service mutex poisoned");
///         locked_self.do_thing_result.save_arguments(id);
///         locked_self.do_thing_result.return_value()
///     }
/// }
/// ```
pub struct FakeImplementation<Args, Ret> {
    saved_arguments: Vec<Args>,
    return_value: Option<Ret>,
}

impl<Args, Ret: Clone> FakeImplementation<Args, Ret> {
    pub fn new() -> Self {
        FakeImplementation {
            saved_arguments: Vec::new(),
            return_value: None,
        }
    }

    pub fn save_arguments(&mut self, arguments: Args) {
        self.saved_arguments.push(arguments);
    }

    /// Arguments from every call so far, oldest first
    pub fn calls(&self) -> &[Args] {
        &self.saved_arguments
    }

    pub fn set_return_value(&mut self, return_value: Ret) {
        self.return_value = Some(return_value);
    }

    pub fn return_value(&self) -> Ret {
        self.return_value
            .clone()
            .expect("Tried to return from a mocked function whose return value wasn't set!")
    }
}
