use std::fmt::Display ;
use std::sync::Arc ;
use tracing::Span ;

use crate::PluginDescriptor ;



/// Builds the logger handed to a plugin on initialization.
pub type LoggerFactory = Arc<dyn Fn( &PluginDescriptor ) -> PluginLogger + Send + Sync>;

/// A logger scoped to one plugin.
///
/// Events go through `tracing` under the `plugin` target, carrying the plugin's
/// name in the `plugin` field. Install a subscriber to see them.
#[derive( Debug, Clone )]
pub struct PluginLogger {
    name: Arc<str>,
}

impl PluginLogger {

    pub fn new( name: impl Into<Arc<str>> ) -> Self { Self { name: name.into() }}

    /// The default factory: one logger per plugin, named after the plugin.
    pub fn factory() -> LoggerFactory {
        Arc::new(| descriptor: &PluginDescriptor | Self::new( descriptor.name() ))
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }

    pub fn trace( &self, message: impl Display ) {
        tracing::trace!( target: "plugin", plugin = %self.name, "{}", message );
    }

    pub fn debug( &self, message: impl Display ) {
        tracing::debug!( target: "plugin", plugin = %self.name, "{}", message );
    }

    pub fn info( &self, message: impl Display ) {
        tracing::info!( target: "plugin", plugin = %self.name, "{}", message );
    }

    pub fn warn( &self, message: impl Display ) {
        tracing::warn!( target: "plugin", plugin = %self.name, "{}", message );
    }

    pub fn error( &self, message: impl Display ) {
        tracing::error!( target: "plugin", plugin = %self.name, "{}", message );
    }

    /// A span carrying the plugin's name, for grouping work done on its behalf.
    pub fn span( &self ) -> Span {
        tracing::info_span!( target: "plugin", "plugin", plugin = %self.name )
    }

}
