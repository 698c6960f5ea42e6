//! Factory descriptors
//!
//! A registration describes how to build an entry as a list of
//! dependency names followed by a terminal element. The terminal is a
//! tagged variant instead of something probed at runtime:
//!
//! - [`Terminal::Function`] - a plain callable
//! - [`Terminal::Constructor`] - a constructible type, used by services
//! - [`Terminal::Method`] - an `(owner, method)` pair; the owner may be
//!   a registered name that is resolved first
//! - [`Terminal::Reference`] - `[name]`, a registered entry that must
//!   itself be invocable once resolved
//! - [`Terminal::Name`] - a bare string that names nothing invocable;
//!   only useful for reporting what went wrong
//!
//! [`Declaration`] is what callers register; the
//! [`ParameterIntrospector`](crate::ParameterIntrospector) turns it into
//! a canonical [`Descriptor`].

use crate::{Arguments, DiError, Injectable, Result, Value};
use std::sync::Arc;

/// Type-erased factory function
type FactoryFn = Arc<dyn Fn(Arguments) -> Result<Value> + Send + Sync>;

// =============================================================================
// Function
// =============================================================================

/// A plain callable taking positional arguments.
///
/// # Examples
///
/// ```rust
/// use named_injector::{Arguments, Function, Value};
///
/// let shout = Function::with_parameters(["word"], |args| {
///     let word = args.get::<String>(0)?;
///     Ok(Value::new(word.to_uppercase()))
/// });
///
/// let out = shout.call(Arguments::new(vec![Value::new(String::from("hi"))])).unwrap();
/// assert_eq!(out.downcast_ref::<String>().unwrap(), "HI");
/// assert_eq!(shout.parameters(), Some(&["word".to_string()][..]));
/// ```
#[derive(Clone)]
pub struct Function {
    call: FactoryFn,
    /// Declared parameter names, if the function was built with them
    parameters: Option<Arc<[String]>>,
}

impl Function {
    /// Create a function without declared parameter names.
    ///
    /// Such a function can only be registered with an explicit
    /// dependency list.
    #[inline]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(f),
            parameters: None,
        }
    }

    /// Create a function whose parameter names double as its dependency list.
    pub fn with_parameters<I, S, F>(parameters: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(f),
            parameters: Some(parameters.into_iter().map(Into::into).collect()),
        }
    }

    /// A zero-parameter function that always returns the same value.
    pub fn returning(value: Value) -> Self {
        Self::with_parameters(std::iter::empty::<String>(), move |_| Ok(value.clone()))
    }

    /// Declared parameter names.
    #[inline]
    pub fn parameters(&self) -> Option<&[String]> {
        self.parameters.as_deref()
    }

    /// Call with the given arguments.
    #[inline]
    pub fn call(&self, args: Arguments) -> Result<Value> {
        (self.call)(args)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.parameters {
            Some(parameters) => write!(f, "Function({})", parameters.join(", ")),
            None => f.write_str("Function(..)"),
        }
    }
}

// =============================================================================
// Constructor
// =============================================================================

/// A type that can be built from positional arguments.
///
/// `parameters` plays the role of the constructor's parameter names: it
/// is used as the dependency list when a service is registered without
/// one. `#[derive(Construct)]` (feature `derive`) generates both items
/// from the struct's named fields.
///
/// # Examples
///
/// ```rust
/// use named_injector::{Arguments, Construct, Result};
/// use std::sync::Arc;
///
/// struct Mailer {
///     host: Arc<String>,
/// }
///
/// impl Construct for Mailer {
///     fn parameters() -> &'static [&'static str] {
///         &["host"]
///     }
///
///     fn construct(args: Arguments) -> Result<Self> {
///         Ok(Mailer { host: args.get(0)? })
///     }
/// }
/// ```
pub trait Construct: Injectable + Sized {
    /// Ordered parameter names of the constructor
    fn parameters() -> &'static [&'static str];

    /// Build an instance from resolved arguments
    fn construct(args: Arguments) -> Result<Self>;
}

/// Type-erased constructor for a [`Construct`] type.
#[derive(Clone)]
pub struct Constructor {
    type_name: &'static str,
    parameters: &'static [&'static str],
    build: FactoryFn,
}

impl Constructor {
    /// Constructor of `T`.
    #[inline]
    pub fn of<T: Construct>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            parameters: T::parameters(),
            build: Arc::new(|args| T::construct(args).map(Value::new)),
        }
    }

    /// Name of the constructed type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Parameter names of the constructor.
    #[inline]
    pub fn parameters(&self) -> &'static [&'static str] {
        self.parameters
    }

    /// Build a new instance.
    #[inline]
    pub fn construct(&self, args: Arguments) -> Result<Value> {
        (self.build)(args)
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}

// =============================================================================
// Method objects
// =============================================================================

/// An object exposing methods addressable by name.
///
/// This is what `(owner, method)` terminals dispatch to.
pub trait Methods: Send + Sync {
    /// Whether `method` can be called on this object
    fn responds_to(&self, method: &str) -> bool;

    /// Call `method` with positional arguments
    fn call(&self, method: &str, args: Arguments) -> Result<Value>;

    /// Declared parameter names of `method`, if known
    fn parameters(&self, _method: &str) -> Option<Vec<String>> {
        None
    }
}

/// Shared handle to a [`Methods`] implementation.
#[derive(Clone)]
pub struct MethodObject {
    object: Arc<dyn Methods>,
    type_name: &'static str,
}

impl MethodObject {
    /// Wrap an object.
    #[inline]
    pub fn new<M: Methods + 'static>(object: M) -> Self {
        Self::from_arc(Arc::new(object))
    }

    /// Wrap an already shared object.
    #[inline]
    pub fn from_arc<M: Methods + 'static>(object: Arc<M>) -> Self {
        Self {
            object,
            type_name: std::any::type_name::<M>(),
        }
    }

    /// Name of the wrapped type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// See [`Methods::responds_to`].
    #[inline]
    pub fn responds_to(&self, method: &str) -> bool {
        self.object.responds_to(method)
    }

    /// See [`Methods::call`].
    #[inline]
    pub fn call(&self, method: &str, args: Arguments) -> Result<Value> {
        self.object.call(method, args)
    }

    /// See [`Methods::parameters`].
    #[inline]
    pub fn parameters(&self, method: &str) -> Option<Vec<String>> {
        self.object.parameters(method)
    }
}

impl std::fmt::Debug for MethodObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}

// =============================================================================
// Terminal / Descriptor / Declaration
// =============================================================================

/// Owner of a method terminal.
#[derive(Debug, Clone)]
pub enum Owner {
    /// A registered name resolved through the injector
    Name(String),
    /// An object supplied directly
    Object(MethodObject),
}

/// The last element of a dependency descriptor.
#[derive(Debug, Clone)]
pub enum Terminal {
    /// A plain callable
    Function(Function),
    /// A constructible type
    Constructor(Constructor),
    /// A method called on an owner
    Method { owner: Owner, method: String },
    /// A registered entry that must resolve to a function value
    Reference(String),
    /// A string naming nothing invocable or constructible
    Name(String),
}

impl Terminal {
    /// `[owner_name, method]`
    pub fn method(owner: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            owner: Owner::Name(owner.into()),
            method: method.into(),
        }
    }

    /// `[object, method]`
    pub fn object_method(object: MethodObject, method: impl Into<String>) -> Self {
        Self::Method {
            owner: Owner::Object(object),
            method: method.into(),
        }
    }

    /// `[name]`
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// A bare name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Constructor of `T`.
    pub fn constructor<T: Construct>() -> Self {
        Self::Constructor(Constructor::of::<T>())
    }

    /// Whether this terminal can stand at the end of an explicit list.
    #[inline]
    pub(crate) fn is_resolvable(&self) -> bool {
        !matches!(self, Self::Name(_))
    }
}

impl std::fmt::Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function(function) => write!(f, "{function:?}"),
            Self::Constructor(constructor) => f.write_str(constructor.type_name()),
            Self::Method {
                owner: Owner::Name(name),
                method,
            } => write!(f, "{name}::{method}"),
            Self::Method {
                owner: Owner::Object(object),
                method,
            } => write!(f, "{}::{method}", object.type_name()),
            Self::Reference(name) => write!(f, "[{name}]"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<Function> for Terminal {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Constructor> for Terminal {
    fn from(constructor: Constructor) -> Self {
        Self::Constructor(constructor)
    }
}

/// Canonical form: dependency names plus a terminal.
#[derive(Debug, Clone)]
pub struct Descriptor {
    dependencies: Vec<String>,
    terminal: Terminal,
}

impl Descriptor {
    /// Create a descriptor.
    pub fn new<I, S>(dependencies: I, terminal: impl Into<Terminal>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            terminal: terminal.into(),
        }
    }

    /// Dependency names, in argument order.
    #[inline]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// The terminal element.
    #[inline]
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }
}

/// A registration argument as supplied by the caller.
///
/// # Examples
///
/// ```rust
/// use named_injector::{declare, Declaration, Function, Value};
///
/// // Explicit dependency list
/// let explicit = declare!["aValue" => fn |args| Ok(args.value(0)?.clone())];
/// assert!(matches!(explicit, Declaration::List(_)));
///
/// // Dependencies taken from the declared parameter names
/// let bare: Declaration = Function::with_parameters(["aValue"], |args| {
///     Ok(args.value(0)?.clone())
/// })
/// .into();
/// assert!(matches!(bare, Declaration::Bare(_)));
/// ```
#[derive(Debug, Clone)]
pub enum Declaration {
    /// Dependency names followed by a terminal
    List(Descriptor),
    /// A terminal whose dependency names must be introspected
    Bare(Terminal),
}

impl Declaration {
    /// Explicit dependency list followed by a terminal.
    pub fn new<I, S>(dependencies: I, terminal: impl Into<Terminal>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(Descriptor::new(dependencies, terminal))
    }
}

impl From<Descriptor> for Declaration {
    fn from(descriptor: Descriptor) -> Self {
        Self::List(descriptor)
    }
}

impl From<Terminal> for Declaration {
    fn from(terminal: Terminal) -> Self {
        Self::Bare(terminal)
    }
}

impl From<Function> for Declaration {
    fn from(function: Function) -> Self {
        Self::Bare(Terminal::Function(function))
    }
}

impl From<Constructor> for Declaration {
    fn from(constructor: Constructor) -> Self {
        Self::Bare(Terminal::Constructor(constructor))
    }
}

impl From<&str> for Declaration {
    fn from(name: &str) -> Self {
        Self::Bare(Terminal::Name(name.to_owned()))
    }
}

/// Build a [`Declaration`] from dependency names and a terminal.
///
/// `fn` before the terminal wraps a closure in [`Function::new`].
///
/// ```rust
/// use named_injector::{declare, Terminal};
///
/// let from_closure = declare!["Dep1", "Dep2" => fn |args| Ok(args.value(1)?.clone())];
/// let late_bound = declare!["Dep1", "Dep2" => Terminal::method("Controller", "action_one")];
/// let no_deps = declare![=> fn |_| Ok(named_injector::Value::null())];
/// ```
#[macro_export]
macro_rules! declare {
    ($($dep:expr),* $(,)? => fn $factory:expr) => {
        $crate::Declaration::new(
            {
                let dependencies: ::std::vec::Vec<::std::string::String> =
                    ::std::vec![$(::std::string::String::from($dep)),*];
                dependencies
            },
            $crate::Function::new($factory),
        )
    };
    ($($dep:expr),* $(,)? => $terminal:expr) => {
        $crate::Declaration::new(
            {
                let dependencies: ::std::vec::Vec<::std::string::String> =
                    ::std::vec![$(::std::string::String::from($dep)),*];
                dependencies
            },
            $terminal,
        )
    };
}

/// Fail helper for [`Methods::call`] implementations.
#[inline]
pub fn unknown_method(type_name: &str, method: &str) -> DiError {
    DiError::creation_failed(format!("{type_name}::{method}"), "unknown method")
}
