//! POM file parsing: dependency declarations, parent inheritance, property interpolation, BOM imports.
//!
//! [`parse_pom`] reads one document. Inheritance is applied afterwards by
//! whoever can fetch the parent and imported POMs: [`Pom::inherit_parent`]
//! for the `<parent>` chain and [`Pom::import_management`] for each BOM.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use marlin_core::dependency::{Dependency, DependencyKey, Exclusion, Scope, DEFAULT_TYPE, WILDCARD};
use marlin_core::version::Version;
use marlin_util::errors::{MarlinError, MarlinResult};

/// Upper bound on placeholder substitution passes.
pub const MAX_INTERPOLATION_PASSES: usize = 32;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub inception_year: Option<String>,

    pub parent: Option<ParentRef>,
    /// Declared properties plus synthetic `project.*` entries.
    pub properties: BTreeMap<String, String>,
    /// `<dependencies>` in declaration order, placeholders unresolved.
    pub dependencies: Vec<PomDependency>,
    /// `<dependencyManagement>` keyed by identity.
    pub dependency_management: BTreeMap<DependencyKey, PomDependency>,
    /// BOMs already merged into `dependency_management`.
    imported: HashSet<DependencyKey>,
    /// Management declarations in document order, before keying.
    managed: Vec<PomDependency>,
    effective: OnceLock<Vec<PomDependency>>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

/// A dependency declared in a POM file.
///
/// `version`, `scope` and `optional` stay unset when the declaration leaves
/// them out, so dependency management can fill them in later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<String>,
    pub exclusions: Vec<Exclusion>,
}

impl PomDependency {
    /// Whether this declaration imports a BOM.
    pub fn is_import(&self) -> bool {
        self.scope.as_deref() == Some("import") && self.type_.as_deref() == Some("pom")
    }

    pub fn is_optional(&self) -> bool {
        self.optional.as_deref().map(str::trim) == Some("true")
    }

    /// The declared scope, `compile` when unset.
    pub fn scope(&self) -> Option<Scope> {
        Scope::parse(self.scope.as_deref().unwrap_or(Scope::Compile.as_str()))
    }

    /// Convert to a resolved coordinate; an unset version becomes [`Version::UNKNOWN`].
    pub fn to_dependency(&self) -> Dependency {
        let version = self
            .version
            .as_deref()
            .map_or(Version::UNKNOWN, Version::parse);
        Dependency::new(self.group_id.as_str(), self.artifact_id.as_str(), version)
            .with_classifier(self.classifier.clone().unwrap_or_default())
            .with_type(self.type_.clone().unwrap_or_else(|| DEFAULT_TYPE.to_string()))
            .with_exclusions(self.exclusions.iter().cloned())
    }
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Replace `${name}` placeholders from the property map.
    ///
    /// Unknown names are left verbatim. Substitution repeats until the text
    /// stops changing or [`MAX_INTERPOLATION_PASSES`] is reached, so cyclic
    /// or self-referential properties terminate.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        for _ in 0..MAX_INTERPOLATION_PASSES {
            if !result.contains("${") {
                break;
            }
            let next = self.substitute_once(&result);
            if next == result {
                break;
            }
            result = next;
        }
        result
    }

    fn substitute_once(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let key = &after[..end];
            match self.properties.get(key) {
                Some(value) => out.push_str(value),
                None => {
                    out.push_str("${");
                    out.push_str(key);
                    out.push('}');
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Coordinates of the parent POM with placeholders resolved.
    pub fn parent_dependency(&self) -> Option<Dependency> {
        self.parent.as_ref().map(|p| {
            Dependency::new(
                self.interpolate(&p.group_id),
                self.interpolate(&p.artifact_id),
                Version::parse(&self.interpolate(&p.version)),
            )
            .with_type("pom")
        })
    }

    /// This project's own coordinates.
    pub fn project_dependency(&self) -> Option<Dependency> {
        let group = self.effective_group_id()?;
        let artifact = self.artifact_id.as_deref()?;
        let version = self.effective_version().unwrap_or_default();
        Some(Dependency::new(
            self.interpolate(group),
            self.interpolate(artifact),
            Version::parse(&self.interpolate(version)),
        ))
    }

    /// Identity of a declaration, with placeholders in its coordinates resolved.
    pub fn key_of(&self, dep: &PomDependency) -> DependencyKey {
        DependencyKey {
            group_id: self.interpolate(&dep.group_id),
            artifact_id: self.interpolate(&dep.artifact_id),
            classifier: dep
                .classifier
                .as_deref()
                .map(|c| self.interpolate(c))
                .unwrap_or_default(),
            type_: dep
                .type_
                .as_deref()
                .map(|t| self.interpolate(t))
                .unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        }
    }

    /// `dep` with every string field placeholder-resolved.
    pub fn resolve_declaration(&self, dep: &PomDependency) -> PomDependency {
        let opt = |value: &Option<String>| value.as_deref().map(|v| self.interpolate(v));
        PomDependency {
            group_id: self.interpolate(&dep.group_id),
            artifact_id: self.interpolate(&dep.artifact_id),
            version: opt(&dep.version),
            classifier: opt(&dep.classifier),
            type_: opt(&dep.type_),
            scope: opt(&dep.scope),
            optional: opt(&dep.optional),
            exclusions: dep
                .exclusions
                .iter()
                .map(|e| Exclusion::new(self.interpolate(&e.group_id), self.interpolate(&e.artifact_id)))
                .collect(),
        }
    }

    /// Key this document's own management declarations with the current
    /// property map. Earlier declarations win over later duplicates.
    pub fn index_management(&mut self) {
        let managed = std::mem::take(&mut self.managed);
        for dep in managed {
            let key = self.key_of(&dep);
            self.dependency_management.entry(key).or_insert(dep);
        }
    }

    /// Merge a fully-loaded parent POM into this one. Local entries win for
    /// properties, management and dependencies.
    pub fn inherit_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        self.index_management();
        for (key, dep) in &parent.dependency_management {
            self.dependency_management
                .entry(key.clone())
                .or_insert_with(|| dep.clone());
        }
        self.imported.extend(parent.imported.iter().cloned());

        let local: HashSet<DependencyKey> =
            self.dependencies.iter().map(|d| self.key_of(d)).collect();
        for dep in &parent.dependencies {
            if !local.contains(&self.key_of(dep)) {
                self.dependencies.push(dep.clone());
            }
        }
        self.effective = OnceLock::new();
    }

    /// BOM declarations that have not been merged yet, keyed as in
    /// `dependency_management`.
    pub fn pending_imports(&self) -> Vec<(DependencyKey, Dependency)> {
        self.dependency_management
            .iter()
            .filter(|(key, dep)| dep.is_import() && !self.imported.contains(*key))
            .map(|(key, dep)| (key.clone(), self.resolve_declaration(dep).to_dependency()))
            .collect()
    }

    /// Merge an imported BOM's management table; entries already present win.
    pub fn import_management(&mut self, bom_key: DependencyKey, bom: &Pom) {
        for (key, dep) in &bom.dependency_management {
            if !self.dependency_management.contains_key(key) {
                self.dependency_management
                    .insert(key.clone(), bom.resolve_declaration(dep));
            }
        }
        self.imported.insert(bom_key);
        self.imported.extend(bom.imported.iter().cloned());
        self.effective = OnceLock::new();
    }

    /// Direct dependencies whose scope is in `scopes`, grouped by scope.
    ///
    /// Management fills unset version, scope, optional and exclusions; scope
    /// defaults to `compile`; optional and non-jar declarations are dropped.
    /// The scope-independent part is computed once per document.
    pub fn dependencies_in(&self, scopes: &[Scope]) -> BTreeMap<Scope, Vec<PomDependency>> {
        let mut grouped: BTreeMap<Scope, Vec<PomDependency>> = BTreeMap::new();
        for dep in self.effective_dependencies() {
            if let Some(scope) = dep.scope().filter(|s| scopes.contains(s)) {
                grouped.entry(scope).or_default().push(dep.clone());
            }
        }
        grouped
    }

    /// Direct dependencies for `scopes`, flattened in the order `scopes`
    /// lists them, then in declaration order.
    pub fn dependencies_for(&self, scopes: &[Scope]) -> Vec<PomDependency> {
        let mut grouped = self.dependencies_in(scopes);
        scopes
            .iter()
            .filter_map(|scope| grouped.remove(scope))
            .flatten()
            .collect()
    }

    fn effective_dependencies(&self) -> &[PomDependency] {
        self.effective.get_or_init(|| {
            self.dependencies
                .iter()
                .filter_map(|declared| self.apply_management(declared))
                .collect()
        })
    }

    fn apply_management(&self, declared: &PomDependency) -> Option<PomDependency> {
        let mut dep = declared.clone();
        if let Some(managed) = self.dependency_management.get(&self.key_of(declared)) {
            if dep.version.is_none() {
                dep.version = managed.version.clone();
            }
            if dep.scope.is_none() {
                dep.scope = managed.scope.clone();
            }
            if dep.optional.is_none() {
                dep.optional = managed.optional.clone();
            }
            if dep.exclusions.is_empty() {
                dep.exclusions = managed.exclusions.clone();
            }
        }
        if dep.scope.is_none() {
            dep.scope = Some(Scope::Compile.as_str().to_string());
        }

        let dep = self.resolve_declaration(&dep);
        if dep.is_optional() {
            tracing::trace!("Skipping optional {}:{}", dep.group_id, dep.artifact_id);
            return None;
        }
        if dep.type_.as_deref().is_some_and(|t| t != DEFAULT_TYPE) {
            return None;
        }
        Some(dep)
    }

    fn add_project_properties(&mut self) {
        let mut synthetic = BTreeMap::new();
        let fields = [
            ("groupId", self.effective_group_id().map(str::to_string)),
            ("artifactId", self.artifact_id.clone()),
            ("version", self.effective_version().map(str::to_string)),
            ("packaging", self.packaging.clone()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("url", self.url.clone()),
            ("inceptionYear", self.inception_year.clone()),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                synthetic.insert(format!("project.{field}"), value.clone());
                synthetic.insert(format!("pom.{field}"), value);
            }
        }
        if let Some(parent) = &self.parent {
            synthetic.insert("project.parent.groupId".to_string(), parent.group_id.clone());
            synthetic.insert("project.parent.artifactId".to_string(), parent.artifact_id.clone());
            synthetic.insert("project.parent.version".to_string(), parent.version.clone());
        }
        for (k, v) in synthetic {
            self.properties.entry(k).or_insert(v);
        }
    }
}

/// Where the parser is inside the document. Each variant knows its
/// enclosing context, so no element stack is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Document,
    Project,
    Parent,
    Properties,
    DependencyManagement,
    ManagedDependencies,
    Dependencies,
    Dependency { managed: bool },
    Exclusions { managed: bool },
    Exclusion { managed: bool },
}

impl Context {
    fn enclosing(self) -> Context {
        match self {
            Context::Document | Context::Project => Context::Document,
            Context::Parent
            | Context::Properties
            | Context::DependencyManagement
            | Context::Dependencies => Context::Project,
            Context::ManagedDependencies => Context::DependencyManagement,
            Context::Dependency { managed: true } => Context::ManagedDependencies,
            Context::Dependency { managed: false } => Context::Dependencies,
            Context::Exclusions { managed } => Context::Dependency { managed },
            Context::Exclusion { managed } => Context::Exclusions { managed },
        }
    }

    /// Child elements whose text is captured in this context.
    fn is_field(self, tag: &str) -> bool {
        match self {
            Context::Project => matches!(
                tag,
                "groupId"
                    | "artifactId"
                    | "version"
                    | "packaging"
                    | "name"
                    | "description"
                    | "url"
                    | "inceptionYear"
            ),
            Context::Parent => matches!(tag, "groupId" | "artifactId" | "version" | "relativePath"),
            Context::Properties => true,
            Context::Dependency { .. } => matches!(
                tag,
                "groupId" | "artifactId" | "version" | "classifier" | "type" | "scope" | "optional"
            ),
            Context::Exclusion { .. } => matches!(tag, "groupId" | "artifactId"),
            _ => false,
        }
    }

    /// The context entered by a structural child element, if any.
    fn child(self, tag: &str) -> Option<Context> {
        match (self, tag) {
            (Context::Document, "project") => Some(Context::Project),
            (Context::Project, "parent") => Some(Context::Parent),
            (Context::Project, "properties") => Some(Context::Properties),
            (Context::Project, "dependencyManagement") => Some(Context::DependencyManagement),
            (Context::Project, "dependencies") => Some(Context::Dependencies),
            (Context::DependencyManagement, "dependencies") => Some(Context::ManagedDependencies),
            (Context::ManagedDependencies, "dependency") => Some(Context::Dependency { managed: true }),
            (Context::Dependencies, "dependency") => Some(Context::Dependency { managed: false }),
            (Context::Dependency { managed }, "exclusions") => Some(Context::Exclusions { managed }),
            (Context::Exclusions { managed }, "exclusion") => Some(Context::Exclusion { managed }),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum ParseState {
    In(Context),
    /// Capturing the text of a field element.
    Field { context: Context, name: String, text: String },
    /// Inside an element nobody reads; `depth` counts open tags.
    Ignored { context: Context, depth: usize },
}

/// Partially-built values for the element currently open.
#[derive(Default)]
struct Builder {
    pom: Pom,
    parent: ParentRef,
    dependency: PomDependency,
    exclusion_group: Option<String>,
    exclusion_artifact: Option<String>,
}

impl Builder {
    fn set_field(&mut self, context: Context, name: &str, text: String) {
        match context {
            Context::Project => match name {
                "groupId" => self.pom.group_id = Some(text),
                "artifactId" => self.pom.artifact_id = Some(text),
                "version" => self.pom.version = Some(text),
                "packaging" => self.pom.packaging = Some(text),
                "name" => self.pom.name = Some(text),
                "description" => self.pom.description = Some(text),
                "url" => self.pom.url = Some(text),
                "inceptionYear" => self.pom.inception_year = Some(text),
                _ => {}
            },
            Context::Parent => match name {
                "groupId" => self.parent.group_id = text,
                "artifactId" => self.parent.artifact_id = text,
                "version" => self.parent.version = text,
                "relativePath" => self.parent.relative_path = Some(text),
                _ => {}
            },
            Context::Properties => {
                self.pom.properties.insert(name.to_string(), text);
            }
            Context::Dependency { .. } => match name {
                "groupId" => self.dependency.group_id = text,
                "artifactId" => self.dependency.artifact_id = text,
                "version" => self.dependency.version = Some(text),
                "classifier" => self.dependency.classifier = Some(text),
                "type" => self.dependency.type_ = Some(text),
                "scope" => self.dependency.scope = Some(text),
                "optional" => self.dependency.optional = Some(text),
                _ => {}
            },
            Context::Exclusion { .. } => match name {
                "groupId" => self.exclusion_group = Some(text),
                "artifactId" => self.exclusion_artifact = Some(text),
                _ => {}
            },
            _ => {}
        }
    }

    fn open(&mut self, context: Context) {
        match context {
            Context::Parent => self.parent = ParentRef::default(),
            Context::Dependency { .. } => self.dependency = PomDependency::default(),
            Context::Exclusion { .. } => {
                self.exclusion_group = None;
                self.exclusion_artifact = None;
            }
            _ => {}
        }
    }

    fn close(&mut self, context: Context) {
        match context {
            Context::Parent => self.pom.parent = Some(std::mem::take(&mut self.parent)),
            Context::Dependency { managed } => {
                let dep = std::mem::take(&mut self.dependency);
                if managed {
                    self.pom.managed.push(dep);
                } else {
                    self.pom.dependencies.push(dep);
                }
            }
            Context::Exclusion { .. } => {
                // An exclusion without a groupId excludes nothing.
                if let Some(group) = self.exclusion_group.take() {
                    let artifact = self
                        .exclusion_artifact
                        .take()
                        .unwrap_or_else(|| WILDCARD.to_string());
                    self.dependency.exclusions.push(Exclusion::new(group, artifact));
                }
            }
            _ => {}
        }
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// Parse a POM XML string into a [`Pom`].
///
/// The result carries this document's declarations only; `document` names
/// it in error messages.
pub fn parse_pom(xml: &str, document: &str) -> MarlinResult<Pom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = Builder::default();
    let mut state = ParseState::In(Context::Document);
    let mut saw_project = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            MarlinError::parsing(
                document,
                format!("at position {}: {e}", reader.buffer_position()),
            )
        })?;

        state = match (state, event) {
            (ParseState::In(context), Event::Start(ref e)) => {
                let tag = tag_name(e);
                if let Some(child) = context.child(&tag) {
                    saw_project |= child == Context::Project;
                    builder.open(child);
                    ParseState::In(child)
                } else if context.is_field(&tag) {
                    ParseState::Field {
                        context,
                        name: tag,
                        text: String::new(),
                    }
                } else if context == Context::Document {
                    return Err(MarlinError::parsing(
                        document,
                        format!("expected <project> root element, found <{tag}>"),
                    ));
                } else {
                    ParseState::Ignored { context, depth: 1 }
                }
            }
            (ParseState::In(context), Event::Empty(ref e)) => {
                let tag = tag_name(e);
                if let Some(child) = context.child(&tag) {
                    saw_project |= child == Context::Project;
                    builder.open(child);
                    builder.close(child);
                } else if context.is_field(&tag) {
                    builder.set_field(context, &tag, String::new());
                }
                ParseState::In(context)
            }
            (ParseState::In(context), Event::End(_)) => {
                builder.close(context);
                ParseState::In(context.enclosing())
            }
            (ParseState::Field { context, name, mut text }, Event::Text(ref e)) => {
                let chunk = e
                    .unescape()
                    .map_err(|err| MarlinError::parsing(document, err.to_string()))?;
                text.push_str(&chunk);
                ParseState::Field { context, name, text }
            }
            (ParseState::Field { context, name, mut text }, Event::CData(ref e)) => {
                text.push_str(&String::from_utf8_lossy(e));
                ParseState::Field { context, name, text }
            }
            (ParseState::Field { context, name, text }, Event::End(_)) => {
                builder.set_field(context, &name, text.trim().to_string());
                ParseState::In(context)
            }
            // A field that turns out to have child elements is not a field.
            (ParseState::Field { context, .. }, Event::Start(_)) => {
                ParseState::Ignored { context, depth: 2 }
            }
            (ParseState::Ignored { context, depth }, Event::Start(_)) => ParseState::Ignored {
                context,
                depth: depth + 1,
            },
            (ParseState::Ignored { context, depth }, Event::End(_)) => {
                if depth == 1 {
                    ParseState::In(context)
                } else {
                    ParseState::Ignored {
                        context,
                        depth: depth - 1,
                    }
                }
            }
            (_, Event::Eof) => break,
            (state, _) => state,
        };
    }

    if !saw_project {
        return Err(MarlinError::parsing(document, "missing <project> root element"));
    }

    let mut pom = builder.pom;
    pom.add_project_properties();
    Ok(pom)
}
