//! Dependency declaration resolution
//!
//! Turns whatever a caller registered into a canonical [`Descriptor`].
//! An explicit list is used as-is; a bare terminal gets its dependency
//! names from a [`ParameterIntrospector`].
//!
//! Rust has no runtime view of parameter names, so the default
//! [`DeclaredParameters`] reads names that were declared up front:
//! [`Function::with_parameters`](crate::Function::with_parameters),
//! [`Construct::parameters`](crate::Construct::parameters) and
//! [`Methods::parameters`](crate::Methods::parameters).

use crate::{Declaration, Descriptor, DiError, Owner, Result, Terminal};

/// Extracts the ordered parameter names of a callable or constructor.
pub trait ParameterIntrospector: Send + Sync {
    /// Parameter names of `terminal`, or `InvalidArgument` if there are none to find.
    fn parameters(&self, terminal: &Terminal) -> Result<Vec<String>>;

    /// Normalize a registration argument into a descriptor.
    fn normalize(&self, declaration: Declaration) -> Result<Descriptor> {
        match declaration {
            Declaration::List(descriptor) if descriptor.terminal().is_resolvable() => Ok(descriptor),
            Declaration::List(descriptor) => Err(DiError::invalid_argument(format!(
                "list ending in '{}'",
                descriptor.terminal()
            ))),
            Declaration::Bare(terminal) => {
                let dependencies = self.parameters(&terminal)?;
                Ok(Descriptor::new(dependencies, terminal))
            }
        }
    }
}

/// Introspector reading declared parameter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredParameters;

impl ParameterIntrospector for DeclaredParameters {
    fn parameters(&self, terminal: &Terminal) -> Result<Vec<String>> {
        match terminal {
            Terminal::Function(function) => function
                .parameters()
                .map(<[String]>::to_vec)
                .ok_or_else(|| DiError::invalid_argument("function without declared parameters")),
            Terminal::Constructor(constructor) => Ok(constructor
                .parameters()
                .iter()
                .map(|name| (*name).to_owned())
                .collect()),
            Terminal::Method {
                owner: Owner::Object(object),
                method,
            } => object
                .parameters(method)
                .ok_or_else(|| DiError::invalid_argument(format!("{}::{method}", object.type_name()))),
            Terminal::Method {
                owner: Owner::Name(name),
                method,
            } => Err(DiError::invalid_argument(format!("unresolved method {name}::{method}"))),
            Terminal::Reference(name) => Err(DiError::invalid_argument(format!("reference [{name}]"))),
            Terminal::Name(name) => Err(DiError::invalid_argument(format!("str \"{name}\""))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arguments, Construct, Function, MethodObject, Methods, Value};

    struct Foo;

    impl Construct for Foo {
        fn parameters() -> &'static [&'static str] {
            &["A", "B", "C"]
        }

        fn construct(_args: Arguments) -> Result<Self> {
            Ok(Foo)
        }
    }

    impl Methods for Foo {
        fn responds_to(&self, method: &str) -> bool {
            method == "bar"
        }

        fn call(&self, _method: &str, _args: Arguments) -> Result<Value> {
            Ok(Value::null())
        }

        fn parameters(&self, method: &str) -> Option<Vec<String>> {
            (method == "bar").then(|| vec!["A".into(), "B".into(), "C".into()])
        }
    }

    fn dependencies(declaration: impl Into<Declaration>) -> Result<Vec<String>> {
        DeclaredParameters
            .normalize(declaration.into())
            .map(|descriptor| descriptor.dependencies().to_vec())
    }

    #[test]
    fn test_extracts_from_every_declared_form() {
        let function = Function::with_parameters(["A", "B", "C"], |_| Ok(Value::null()));
        let constructor = Terminal::constructor::<Foo>();
        let method = Terminal::object_method(MethodObject::new(Foo), "bar");

        assert_eq!(dependencies(function).unwrap(), ["A", "B", "C"]);
        assert_eq!(dependencies(constructor).unwrap(), ["A", "B", "C"]);
        assert_eq!(dependencies(method).unwrap(), ["A", "B", "C"]);
    }

    #[test]
    fn test_explicit_list_is_kept() {
        let declaration = Declaration::new(["x"], Terminal::reference("factory"));
        let descriptor = DeclaredParameters.normalize(declaration).unwrap();

        assert_eq!(descriptor.dependencies(), ["x"]);
        assert!(matches!(descriptor.terminal(), Terminal::Reference(name) if name == "factory"));
    }

    #[test]
    fn test_bare_string_is_invalid() {
        let err = dependencies("string-no-argument").unwrap_err();
        assert!(matches!(err, DiError::InvalidArgument { .. }));
    }

    #[test]
    fn test_list_ending_in_name_is_invalid() {
        let declaration = Declaration::new(["A"], Terminal::named("UnknownClassName"));
        assert!(matches!(
            DeclaredParameters.normalize(declaration),
            Err(DiError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_undeclared_function_is_invalid() {
        let err = dependencies(Function::new(|_| Ok(Value::null()))).unwrap_err();
        assert!(err.to_string().contains("function without declared parameters"));
    }
}
