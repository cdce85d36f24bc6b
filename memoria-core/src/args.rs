use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// A value that can be passed to a memoized callable.
///
/// Implemented for every `'static` type that is `Debug + Send + Sync`, so
/// callers never implement it by hand. `Debug` backs the value-conversion key
/// strategy; `Any` lets the callable recover the concrete type.
pub trait Argument: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Debug + Send + Sync> Argument for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A shared argument. Its allocation is the argument's identity.
pub type Arg = Arc<dyn Argument>;

/// Argument list of one call: positional arguments plus named arguments.
///
/// Named arguments keep the order the caller supplied them in; the key
/// deriver sorts them by name. Supplying the same name twice keeps the last
/// value.
///
/// # Examples
///
/// ```
/// use memoria_core::CallArgs;
///
/// let args = CallArgs::new().arg(3_i32).named("scale", 2.5_f64);
/// assert_eq!(args.get::<i32>(0), Some(&3));
/// assert_eq!(args.named_value::<f64>("scale"), Some(&2.5));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallArgs {
    positional: Vec<Arg>,
    named: Vec<(String, Arg)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument, allocating a fresh identity for it.
    pub fn arg<T: Argument>(self, value: T) -> Self {
        self.arg_shared(Arc::new(value))
    }

    /// Appends an already shared positional argument, keeping its identity.
    pub fn arg_shared(mut self, value: Arg) -> Self {
        self.positional.push(value);
        self
    }

    /// Adds a named argument, allocating a fresh identity for the value.
    pub fn named<T: Argument>(self, name: impl Into<String>, value: T) -> Self {
        self.named_shared(name, Arc::new(value))
    }

    /// Adds a named argument whose value is already shared.
    pub fn named_shared(mut self, name: impl Into<String>, value: Arg) -> Self {
        let name = name.into();
        match self.named.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.named.push((name, value)),
        }
        self
    }

    /// Returns a copy of these arguments with `receiver` as the first positional argument.
    pub fn with_receiver(&self, receiver: Arg) -> Self {
        let mut positional = Vec::with_capacity(self.positional.len() + 1);
        positional.push(receiver);
        positional.extend(self.positional.iter().cloned());
        Self {
            positional,
            named: self.named.clone(),
        }
    }

    pub fn positional(&self) -> &[Arg] {
        &self.positional
    }

    pub fn named_args(&self) -> &[(String, Arg)] {
        &self.named
    }

    /// Downcasts the positional argument at `index`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.positional
            .get(index)
            .and_then(|arg| (**arg).as_any().downcast_ref::<T>())
    }

    /// Downcasts the named argument `name`.
    pub fn named_value<T: Any>(&self, name: &str) -> Option<&T> {
        self.named
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, arg)| (**arg).as_any().downcast_ref::<T>())
    }

    /// The bound instance of a method call, i.e. the first positional argument.
    pub fn receiver<T: Any>(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
