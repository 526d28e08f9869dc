use mod_link::get_dependencies_all ;

use crate::test_configs::config ;

#[test]
fn dependency_union_of_roots() {

	let first = config( "first", &[ "shared", "only-first" ]);
	let second = config( "second", &[ "shared", "gone" ]);
	let shared = config( "shared", &[] );
	let only_first = config( "only-first", &[] );
	let known = vec![ first.clone(), second.clone(), shared, only_first ];

	let set = get_dependencies_all( [ &first, &second ], &known );

	// Shared dependencies appear once in the union.
	assert_eq!( set.configurations().len(), 2 );
	assert!( set.contains( "shared" ));
	assert!( set.contains( "only-first" ));
	assert!( set.missing().contains( "gone" ));
	assert_eq!( set.missing().len(), 1 );

}
