use std::sync::Arc ;
use wasm_plugin_loader::{ LoadError, ModuleLoader, ModuleRegistry, NativeBundle, ResolveError };

#[test]
fn delegation_forwards_resolution() {

	let registry = ModuleRegistry::new();
	let parent = ModuleLoader::in_registry( Arc::clone( &registry ));
	let child = ModuleLoader::delegating( parent.clone() );

	assert_eq!( child.delegate(), Some( &parent ));
	assert!( Arc::ptr_eq( child.registry(), &registry ));

	child.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/group.bundle" ).with_shared( "group.Type", ())))
		.expect( "Failed to add artifact" );

	assert_eq!( parent.search_path(), vec![ "file:///plugins/group.bundle".to_string() ]);
	assert_eq!( child.search_path(), parent.search_path() );

	let through_child = child.find_symbol( "group.Type", false ).expect( "Delegated resolution failed" );
	let at_parent = parent.find_symbol( "group.Type", false ).expect( "Local resolution failed" );
	assert_eq!( through_child, at_parent );

}

#[test]
fn delegation_close_keeps_the_delegate() {

	let registry = ModuleRegistry::new();
	let parent = ModuleLoader::in_registry( Arc::clone( &registry ));
	let child = ModuleLoader::delegating( parent.clone() );
	child.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/group.bundle" ).with_shared( "group.Type", ())))
		.expect( "Failed to add artifact" );
	let symbol = child.find_symbol( "group.Type", false ).expect( "Delegated resolution failed" );

	child.close().expect( "Failed to close loader" );

	assert!( symbol.is_live() );
	assert!( !registry.contains( &child ));
	assert!( registry.contains( &parent ));
	assert!( matches!( child.find_symbol( "group.Type", false ), Err( ResolveError::Closed )));
	assert!( matches!( child.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/late.bundle" ))), Err( ResolveError::Closed )));
	assert_eq!( parent.find_symbol( "group.Type", false ).expect( "Delegate lost its symbol" ), symbol );

}

#[test]
fn delegation_failed_lookup_withdraws_artifact() {

	let registry = ModuleRegistry::new();
	let parent = ModuleLoader::in_registry( Arc::clone( &registry ));
	parent.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/group.bundle" ).with_shared( "group.Type", ())))
		.expect( "Failed to add artifact" );
	let child = ModuleLoader::delegating( parent.clone() );

	match child.lookup_main( "sample.Main", Arc::new( NativeBundle::new( "file:///plugins/sample.bundle" ).with_shared( "sample.Main", ()))) {
		Err( LoadError::NotAPlugin( _ )) => {},
		value => panic!( "Expected NotAPlugin, found: {:#?}", value ),
	}

	assert_eq!( parent.search_path(), vec![ "file:///plugins/group.bundle".to_string() ]);
	assert!( !child.is_defined( "sample.Main" ));
	assert!( parent.find_symbol( "group.Type", false ).is_ok() );

}

#[test]
fn delegation_discard_withdraws_attached_artifacts() {

	let registry = ModuleRegistry::new();
	let parent = ModuleLoader::in_registry( Arc::clone( &registry ));
	let kept = ModuleLoader::delegating( parent.clone() );
	let discarded = ModuleLoader::delegating( parent.clone() );

	kept.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/kept.bundle" ).with_shared( "kept.Type", ())))
		.expect( "Failed to add artifact" );
	discarded.add_artifact( Arc::new( NativeBundle::new( "file:///plugins/discarded.bundle" ).with_shared( "discarded.Type", ())))
		.expect( "Failed to add artifact" );
	let symbol = parent.find_symbol( "discarded.Type", false ).expect( "Resolution failed" );

	discarded.discard().expect( "Failed to discard loader" );

	assert!( discarded.is_closed() );
	assert!( !symbol.is_live() );
	assert_eq!( parent.search_path(), vec![ "file:///plugins/kept.bundle".to_string() ]);
	assert!( matches!( parent.find_symbol( "discarded.Type", false ), Err( ResolveError::NotFound( _ ))));
	assert!( parent.find_symbol( "kept.Type", false ).is_ok() );

}
