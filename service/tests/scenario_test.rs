//! End-to-end scenario: a small pet hierarchy built with every operation

use pretty_assertions::assert_eq;
use serde_json::json;
use trellis_core::identity::intern;
use trellis_core::value::member_table;
use trellis_service::prelude::*;

#[test]
fn test_dog_is_a_pet_and_an_animal_but_not_a_cat() -> Result<()> {
    let mut graph = ClassGraph::new();

    let animal = graph.define_class("Animal");
    graph.define_member(animal, "legs", 4)?;

    let pet = graph.define_protocol("Pet", member_table([("feed", Category::Behavior)]));
    let cat = graph.define_class("Cat");

    let dog = graph.define_class("Dog");
    graph.extend(dog, animal)?;
    graph.define_member(
        dog,
        "feed",
        Behavior::native(|state, _| {
            state.insert(intern("fed"), Value::from(true));
            Value::Null
        }),
    )?;
    graph.implement(dog, pet)?;

    let mut rex = graph.instantiate(dog)?;
    assert!(graph.is_a(Some(&rex), pet)?);
    assert!(graph.is_a(Some(&rex), animal)?);
    assert!(!graph.is_a(Some(&rex), cat)?);

    graph.invoke(&mut rex, "feed", &[])?;
    assert_eq!(rex.field("fed"), Some(&Value::from(true)));
    assert_eq!(rex.field("legs"), Some(&Value::from(4)));
    Ok(())
}

#[test]
fn test_pet_shop_hierarchy() -> Result<()> {
    let mut graph = ClassGraph::new();

    let animal = graph.define_class("Animal");
    graph.define_member(animal, "speak", Behavior::native(|_, _| Value::from("...")))?;
    graph.define_static(animal, "kingdom", "animalia")?;

    let pet = graph.define_protocol(
        "Pet",
        member_table([("name", Category::String), ("speak", Category::Behavior)]),
    );

    let tracker = graph.define_bag(
        "Tracker",
        member_table([(
            "visit",
            Behavior::native(|state, _| {
                let visits = state.get("visits").and_then(Value::as_number).unwrap_or(0.0) + 1.0;
                state.insert(intern("visits"), Value::from(visits));
                Value::from(visits)
            }),
        )]),
    );

    let dog = graph.define_class("Dog");
    graph.extend(dog, animal)?;
    graph.define_member(dog, "speak", Behavior::native(|_, _| Value::from("woof")))?;
    graph.define_member(dog, "name", "rex")?;
    graph.mixin(dog, Some(tracker))?;
    graph.implement(dog, pet)?;

    let puppy = graph.define_class("Puppy");
    graph.multi_inherit(puppy, Some(dog))?;

    // Statics travel with extension
    let statics = graph.descriptor(dog).map(|d| d.statics().clone());
    assert_eq!(statics.and_then(|s| s.get("kingdom").cloned()), Some(Value::from("animalia")));

    let mut fido = graph.instantiate(puppy)?;
    assert_eq!(graph.invoke(&mut fido, "speak", &[])?, Value::from("woof"));
    graph.invoke(&mut fido, "visit", &[])?;
    assert_eq!(graph.invoke(&mut fido, "visit", &[])?, Value::from(2));
    assert_eq!(fido.field("visits"), None);

    assert!(graph.is_assignable_from(puppy, animal)?);
    assert!(graph.is_assignable_from(puppy, pet)?);
    assert!(graph.is_a(Some(&fido), pet)?);
    assert!(graph.class_fulfills(puppy, Some(pet))?);

    let stray = PlainObject::from_json(json!({"name": "stray"}))?.with(
        "speak",
        Behavior::native(|_, _| Value::from("meow")),
    );
    assert!(graph.fulfills(Some(&stray), Some(pet))?);
    let statue = PlainObject::from_json(json!({"name": "statue", "speak": "silence"}))?;
    assert!(!graph.fulfills(Some(&statue), Some(pet))?);
    Ok(())
}
