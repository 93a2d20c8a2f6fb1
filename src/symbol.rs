//! Resolved symbols.
//!
//! A [`Symbol`] is a named, loadable code unit. Symbols are produced by an
//! [`Artifact`]( crate::Artifact ) when a [`ModuleLoader`]( crate::ModuleLoader )
//! searches its path, and are shared by handle: cloning a symbol yields another
//! reference to the same definition, and two symbols are equal only if they are
//! the same definition.

use std::any::Any ;
use std::sync::{ Arc, Weak };
use wasmtime::component::Component ;

use crate::artifact::OpenArtifact ;
use crate::plugin_type::PluginType ;

/// What a symbol resolves to.
#[derive( Clone )]
pub enum SymbolKind {
    /// A native plugin type with its construction entry points.
    Plugin( PluginType ),
    /// A compiled wasm component. Components that export `init` satisfy the
    /// plugin contract; any other component is a plain shared unit.
    Component( Component ),
    /// An opaque value shared between plugins.
    Shared( Arc<dyn Any + Send + Sync> ),
}

impl std::fmt::Debug for SymbolKind {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        match self {
            Self::Plugin( plugin_type ) => f.debug_tuple( "Plugin" ).field( plugin_type ).finish(),
            Self::Component( _ ) => f.debug_tuple( "Component" ).field( &"<Component>" ).finish(),
            Self::Shared( _ ) => f.debug_tuple( "Shared" ).field( &"<dyn Any>" ).finish(),
        }
    }
}

/// A definition returned by an artifact, before it is bound to the artifact
/// that produced it.
#[derive( Debug, Clone )]
pub struct Definition {
    /// URL-style source location of the definition
    pub location: String,
    /// The definition itself
    pub kind: SymbolKind,
}

impl Definition {
    /// Creates a new definition.
    #[inline]
    pub fn new( location: impl Into<String>, kind: SymbolKind ) -> Self {
        Self { location: location.into(), kind }
    }
}

struct SymbolData {
    name: String,
    location: String,
    kind: SymbolKind,
    origin: Weak<OpenArtifact>,
}

/// A named code unit resolved by a [`ModuleLoader`]( crate::ModuleLoader ).
#[derive( Clone )]
pub struct Symbol( Arc<SymbolData> );

impl Symbol {

    pub(crate) fn bind( name: &str, definition: Definition, origin: &Arc<OpenArtifact> ) -> Self {
        Self( Arc::new( SymbolData {
            name: name.to_string(),
            location: definition.location,
            kind: definition.kind,
            origin: Arc::downgrade( origin ),
        }))
    }

    /// Fully-qualified name the symbol was resolved under.
    #[inline] pub fn name( &self ) -> &str { &self.0.name }

    /// URL-style location of the code that defines the symbol.
    #[inline] pub fn location( &self ) -> &str { &self.0.location }

    /// What the symbol resolves to.
    #[inline] pub fn kind( &self ) -> &SymbolKind { &self.0.kind }

    /// Whether the artifact that defined this symbol is still open.
    ///
    /// A symbol outlives its artifact only as a dangling description; loaders
    /// never hand out symbols for which this returns `false`.
    pub fn is_live( &self ) -> bool {
        self.0.origin.upgrade().is_some_and(| artifact | artifact.is_open() )
    }

}

impl PartialEq for Symbol {
    fn eq( &self, other: &Self ) -> bool { Arc::ptr_eq( &self.0, &other.0 ) }
}
impl Eq for Symbol {}

impl std::fmt::Debug for Symbol {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Symbol" )
            .field( "name", &self.0.name )
            .field( "location", &self.0.location )
            .field( "kind", &self.0.kind )
            .finish_non_exhaustive()
    }
}
