//! JVM namespace traversal: views, packages, and classes.
//!
//! A [`JvmView`] resolves short names through its import map and promotes
//! names to classes or packages by the Java capitalization convention. A
//! [`PackageProxy`] only accumulates dotted segments locally — no command
//! is sent until a class member is actually used.

use crate::client::GatewayClient;
use crate::error::{GatewayError, Result};
use crate::protocol::{self, Value};
use crate::proxy::{expect_object, ObjectProxy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A namespace view scoping imports on the gateway side.
///
/// The default view is named `rj`; additional views created with
/// [`GatewayClient::new_jvm_view`] have gateway-issued IDs.
#[derive(Debug, Clone)]
pub struct JvmView {
    client: GatewayClient,
    id: String,
    /// Short name -> fully-qualified name, populated by imports.
    imports: Arc<Mutex<HashMap<String, String>>>,
}

/// What a name resolves to inside a view or package.
#[derive(Debug, Clone)]
pub enum JvmMember {
    Class(ClassProxy),
    Package(PackageProxy),
}

impl JvmMember {
    pub fn as_class(&self) -> Option<&ClassProxy> {
        match self {
            JvmMember::Class(class) => Some(class),
            JvmMember::Package(_) => None,
        }
    }

    pub fn as_package(&self) -> Option<&PackageProxy> {
        match self {
            JvmMember::Package(package) => Some(package),
            JvmMember::Class(_) => None,
        }
    }

    /// Unwrap as a class, or fail naming the accumulated package path.
    pub fn into_class(self) -> Result<ClassProxy> {
        match self {
            JvmMember::Class(class) => Ok(class),
            JvmMember::Package(package) => Err(GatewayError::Usage(format!(
                "'{}' is a package; it cannot be constructed or called",
                package.name()
            ))),
        }
    }
}

impl JvmView {
    pub(crate) fn new(client: GatewayClient, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
            imports: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The view's gateway-side identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Import a class or a package wildcard into this view.
    ///
    /// On success the last dotted segment becomes a local shortcut (unless
    /// it is `*`), so `view.get("ArrayList")` resolves after
    /// `java_import("java.util.ArrayList")`.
    pub async fn java_import(&self, fqn: &str) -> Result<()> {
        protocol::validate_identifier("import name", fqn)?;
        self.client
            .execute(
                &[
                    protocol::JVM_VIEW_COMMAND,
                    protocol::VIEW_IMPORT_SUBCOMMAND,
                    &self.id,
                    fqn,
                ],
                &[],
            )
            .await?;
        let shortcut = last_segment(fqn);
        if shortcut != "*" {
            self.imports
                .lock()
                .unwrap()
                .insert(shortcut.to_string(), fqn.to_string());
        }
        Ok(())
    }

    /// Remove a previously imported name from this view.
    pub async fn remove_import(&self, fqn: &str) -> Result<()> {
        protocol::validate_identifier("import name", fqn)?;
        self.client
            .execute(
                &[
                    protocol::JVM_VIEW_COMMAND,
                    protocol::VIEW_REMOVE_IMPORT_SUBCOMMAND,
                    &self.id,
                    fqn,
                ],
                &[],
            )
            .await?;
        let shortcut = last_segment(fqn);
        let mut imports = self.imports.lock().unwrap();
        if imports.get(shortcut).map(String::as_str) == Some(fqn) {
            imports.remove(shortcut);
        }
        Ok(())
    }

    /// Search the view's imported namespace for names matching `pattern`.
    pub async fn search(&self, pattern: &str) -> Result<Vec<String>> {
        protocol::validate_identifier("search pattern", pattern)?;
        let value = self
            .client
            .execute(
                &[
                    protocol::JVM_VIEW_COMMAND,
                    protocol::VIEW_SEARCH_SUBCOMMAND,
                    &self.id,
                    pattern,
                ],
                &[],
            )
            .await?;
        match value {
            Value::Str(joined) => Ok(joined
                .split('\n')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()),
            other => Err(GatewayError::Decode(format!(
                "expected search results, got {other:?}"
            ))),
        }
    }

    /// Resolve a name: imports first, then the capitalization convention
    /// (uppercase first letter promotes to a class).
    ///
    /// The name `then` never resolves, on any proxy kind.
    pub fn get(&self, name: &str) -> Option<JvmMember> {
        if name == "then" {
            return None;
        }
        if let Some(fqn) = self.imports.lock().unwrap().get(name) {
            return Some(JvmMember::Class(ClassProxy::new(self.client.clone(), fqn)));
        }
        if starts_uppercase(name) {
            Some(JvmMember::Class(ClassProxy::new(self.client.clone(), name)))
        } else {
            Some(JvmMember::Package(PackageProxy::new(
                self.client.clone(),
                name,
            )))
        }
    }

    /// Typed accessor: a class by fully-qualified name.
    pub fn class(&self, fqn: &str) -> ClassProxy {
        ClassProxy::new(self.client.clone(), fqn)
    }

    /// Typed accessor: a top-level package.
    pub fn package(&self, name: &str) -> PackageProxy {
        PackageProxy::new(self.client.clone(), name)
    }
}

/// A dotted package path. Purely local until a class is reached.
#[derive(Debug, Clone)]
pub struct PackageProxy {
    client: GatewayClient,
    name: String,
}

impl PackageProxy {
    pub(crate) fn new(client: GatewayClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// The accumulated dotted path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a child: uppercase first letter promotes to a class, any
    /// other name extends the package path. `then` never resolves.
    pub fn get(&self, segment: &str) -> Option<JvmMember> {
        if segment == "then" {
            return None;
        }
        let path = format!("{}.{}", self.name, segment);
        if starts_uppercase(segment) {
            Some(JvmMember::Class(ClassProxy::new(self.client.clone(), path)))
        } else {
            Some(JvmMember::Package(PackageProxy::new(
                self.client.clone(),
                path,
            )))
        }
    }

    /// Extend the package path by one segment.
    pub fn child(&self, segment: &str) -> PackageProxy {
        PackageProxy::new(self.client.clone(), format!("{}.{}", self.name, segment))
    }

    /// A class inside this package.
    pub fn class(&self, simple_name: &str) -> ClassProxy {
        ClassProxy::new(self.client.clone(), format!("{}.{}", self.name, simple_name))
    }
}

/// A JVM class: constructor callable and static member namespace.
#[derive(Debug, Clone)]
pub struct ClassProxy {
    client: GatewayClient,
    fqn: String,
    target_id: String,
}

impl ClassProxy {
    pub(crate) fn new(client: GatewayClient, fqn: impl Into<String>) -> Self {
        let fqn = fqn.into();
        let target_id = format!("{}{}", protocol::STATIC_PREFIX, fqn);
        Self {
            client,
            fqn,
            target_id,
        }
    }

    /// Fully-qualified class name.
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// Static-dispatch target ID (`z:` + FQN).
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Invoke the constructor.
    pub async fn new_instance(&self, args: &[Value]) -> Result<ObjectProxy> {
        let value = self.client.call_constructor(&self.fqn, args).await?;
        expect_object(value, "constructor result")
    }

    /// Invoke a static method.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.client.call_method(&self.target_id, method, args).await
    }

    /// Read a static field.
    pub async fn field(&self, name: &str) -> Result<Value> {
        self.client.get_field(&self.target_id, name).await
    }

    /// Names of the class's static members.
    pub async fn static_members(&self) -> Result<Vec<String>> {
        self.client.get_static_members(&self.fqn).await
    }

    /// Gateway-rendered help text for the class.
    pub async fn help(&self, pattern: Option<&str>) -> Result<String> {
        self.client.help_class(&self.fqn, pattern).await
    }
}

impl PartialEq for ClassProxy {
    fn eq(&self, other: &Self) -> bool {
        self.fqn == other.fqn
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn last_segment(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}
