//! End-to-end synthesis scenarios: registry deduplication, cyclic
//! schemas, extension composition, and effect propagation.

use synthspec_core::{
    ComponentRegistry, ComponentState, EffectKind, LazyNode, Mode, NodeKind, ObjectShape, RefOr,
    SchemaNode, SynthError, SynthState, synthesize,
};

fn output_state() -> SynthState {
    SynthState::new(Mode::Output)
}

/// Pulls a field node back out of an object so another shape can hold the
/// identical identity.
fn shared_field(object: &SchemaNode, name: &str) -> SchemaNode {
    let NodeKind::Object(shape) = object.kind() else {
        panic!("not an object node");
    };
    shape.fields().get(name).expect("field exists").clone()
}

#[test]
fn synthesizes_a_self_referential_schema_finitely() {
    let handle = LazyNode::unresolved();
    let category = SchemaNode::object(
        ObjectShape::new()
            .field("name", SchemaNode::string())
            .field(
                "subcategories",
                SchemaNode::array(SchemaNode::lazy(&handle)),
            ),
    )
    .with_name("Category");
    handle.resolve(category.clone());

    let mut registry = ComponentRegistry::new();
    let fragment =
        synthesize(&category, &output_state(), &mut registry).expect("cycle must terminate");

    // the root comes back as a reference...
    let RefOr::Ref(reference) = &fragment.schema else {
        panic!("expected a reference for the named root");
    };
    assert_eq!(reference.ref_location, "#/components/schemas/Category");

    // ...the definition completed despite containing itself...
    let entry = registry.get(category.id()).expect("registered");
    assert!(entry.is_complete());
    let ComponentState::Complete { schema, .. } = entry.state() else {
        panic!("expected a complete entry");
    };
    insta::assert_json_snapshot!(schema, @r##"
    {
      "type": "object",
      "properties": {
        "name": {
          "type": "string"
        },
        "subcategories": {
          "type": "array",
          "items": {
            "$ref": "#/components/schemas/Category"
          }
        }
      },
      "required": [
        "name",
        "subcategories"
      ]
    }
    "##);

    // ...and the forward reference was reported as a component effect
    assert_eq!(fragment.effects.len(), 1);
    assert_eq!(fragment.effects[0].kind, EffectKind::Component);
    assert_eq!(fragment.effects[0].node, category.id());
    assert_eq!(
        fragment.effects[0].path,
        ["property: subcategories", "items"]
    );
}

#[test]
fn registers_shared_components_once() {
    let address = SchemaNode::object(
        ObjectShape::new()
            .field("street", SchemaNode::string())
            .field("city", SchemaNode::string()),
    )
    .with_name("Address");

    let order = SchemaNode::object(
        ObjectShape::new()
            .field("billing", address.clone())
            .field("shipping", address.clone()),
    );

    let mut registry = ComponentRegistry::new();
    let fragment =
        synthesize(&order, &output_state(), &mut registry).expect("synthesizable schema");

    assert_eq!(registry.len(), 1);
    insta::assert_json_snapshot!(fragment.schema, @r##"
    {
      "type": "object",
      "properties": {
        "billing": {
          "$ref": "#/components/schemas/Address"
        },
        "shipping": {
          "$ref": "#/components/schemas/Address"
        }
      },
      "required": [
        "billing",
        "shipping"
      ]
    }
    "##);
}

#[test]
fn extension_composes_against_registered_base() {
    let base = SchemaNode::object(
        ObjectShape::new()
            .field("id", SchemaNode::integer())
            .field("created_at", SchemaNode::date()),
    )
    .with_name("Resource");

    let extended = SchemaNode::object(
        ObjectShape::new()
            .field("id", shared_field(&base, "id"))
            .field("created_at", shared_field(&base, "created_at"))
            .field("title", SchemaNode::string())
            .field("body", SchemaNode::string().optional())
            .extends(&base),
    )
    .with_name("Article");

    let mut registry = ComponentRegistry::new();
    synthesize(&extended, &output_state(), &mut registry).expect("synthesizable schema");

    insta::assert_json_snapshot!(registry.schemas(), @r##"
    {
      "Article": {
        "type": "object",
        "properties": {
          "title": {
            "type": "string"
          },
          "body": {
            "type": "string"
          }
        },
        "required": [
          "title"
        ],
        "allOf": [
          {
            "$ref": "#/components/schemas/Resource"
          }
        ]
      },
      "Resource": {
        "type": "object",
        "properties": {
          "id": {
            "type": "integer"
          },
          "created_at": {
            "type": "string",
            "format": "date-time"
          }
        },
        "required": [
          "id",
          "created_at"
        ]
      }
    }
    "##);
}

#[test]
fn extension_of_an_in_progress_base_emits_component_effect() {
    let extension_handle = LazyNode::unresolved();
    let base = SchemaNode::object(
        ObjectShape::new()
            .field("name", SchemaNode::string())
            .field(
                "favourite",
                SchemaNode::lazy(&extension_handle).optional(),
            ),
    )
    .with_name("Node");

    let extended = SchemaNode::object(
        ObjectShape::new()
            .field("name", shared_field(&base, "name"))
            .field("favourite", shared_field(&base, "favourite"))
            .field("weight", SchemaNode::number())
            .extends(&base),
    )
    .with_name("WeightedNode");
    extension_handle.resolve(extended.clone());

    let mut registry = ComponentRegistry::new();
    let fragment =
        synthesize(&base, &output_state(), &mut registry).expect("cycle must terminate");

    // both components finished
    assert!(registry.get(base.id()).expect("base").is_complete());
    assert!(registry.get(extended.id()).expect("extension").is_complete());

    // the extension saw its base in progress and still composed with allOf
    let ComponentState::Complete { schema, effects } =
        registry.get(extended.id()).expect("extension").state()
    else {
        panic!("expected a complete entry");
    };
    assert_eq!(schema.all_of.len(), 1);
    assert_eq!(
        schema.properties.keys().map(String::as_str).collect::<Vec<_>>(),
        ["weight"]
    );
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].kind, EffectKind::Component);
    assert_eq!(effects[0].node, base.id());

    // and the base's own effect list carries the forwarded component effect
    assert_eq!(fragment.effects.len(), 1);
    assert_eq!(fragment.effects[0].kind, EffectKind::Component);
}

#[test]
fn required_lists_differ_between_modes() {
    let node = SchemaNode::object(
        ObjectShape::new()
            .field("q", SchemaNode::string())
            .field("page", SchemaNode::integer().with_default(1))
            .field("sort", SchemaNode::string().optional()),
    );

    let mut registry = ComponentRegistry::new();
    let output = synthesize(&node, &output_state(), &mut registry)
        .expect("synthesizable schema");
    let (schema, effects) = output.into_object(&output_state()).expect("plain object");
    assert_eq!(schema.required, ["q", "page"]);
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].mode, Mode::Output);

    let input_state = SynthState::new(Mode::Input);
    let mut registry = ComponentRegistry::new();
    let input =
        synthesize(&node, &input_state, &mut registry).expect("synthesizable schema");
    let (schema, effects) = input.into_object(&input_state).expect("plain object");
    assert_eq!(schema.required, ["q"]);
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].mode, Mode::Input);
}

#[test]
fn effects_flatten_in_traversal_order() {
    let node = SchemaNode::object(
        ObjectShape::new()
            .field(
                "entries",
                SchemaNode::array(SchemaNode::object(
                    ObjectShape::new().field("level", SchemaNode::string().with_default("info")),
                )),
            )
            .field("raw", SchemaNode::string().with_transform()),
    );

    let mut registry = ComponentRegistry::new();
    let fragment =
        synthesize(&node, &output_state(), &mut registry).expect("synthesizable schema");

    let paths = fragment
        .effects
        .iter()
        .map(|effect| effect.path.join(" > "))
        .collect::<Vec<_>>();
    assert_eq!(
        paths,
        [
            "property: entries > items > property: level",
            "property: raw"
        ]
    );
    assert!(
        fragment
            .effects
            .iter()
            .all(|effect| effect.kind == EffectKind::Schema)
    );
}

#[test]
fn complete_components_replay_their_effects_at_each_use_site() {
    let pagination = SchemaNode::object(
        ObjectShape::new().field("limit", SchemaNode::integer().with_default(20)),
    )
    .with_name("Pagination");

    let node = SchemaNode::object(
        ObjectShape::new()
            .field("first", pagination.clone())
            .field("second", pagination.clone()),
    );

    let mut registry = ComponentRegistry::new();
    let fragment =
        synthesize(&node, &output_state(), &mut registry).expect("synthesizable schema");

    // one per use site, both replaying the effect recorded where the
    // component was first synthesized
    assert_eq!(fragment.effects.len(), 2);
    assert_eq!(fragment.effects[0], fragment.effects[1]);
    assert_eq!(
        fragment.effects[0].path,
        ["property: first", "property: limit"]
    );
}

#[test]
fn rejects_two_identities_sharing_a_name() {
    let first = SchemaNode::object(ObjectShape::new().field("a", SchemaNode::string()))
        .with_name("Payload");
    let second = SchemaNode::object(ObjectShape::new().field("b", SchemaNode::string()))
        .with_name("Payload");

    let node = SchemaNode::object(
        ObjectShape::new()
            .field("left", first)
            .field("right", second),
    );

    let mut registry = ComponentRegistry::new();
    let error = synthesize(&node, &output_state(), &mut registry)
        .expect_err("same name, different identities");
    assert!(matches!(error, SynthError::DuplicateRef { .. }));

    // the first binding survived the failed run
    assert_eq!(registry.schemas().len(), 1);
}

#[test]
fn naming_a_bare_alias_of_a_component_is_rejected() {
    // a named node whose definition is just a reference to another named
    // node cannot be materialized as a component of its own
    let inner = SchemaNode::string().with_name("Inner");
    let alias = inner.optional().with_name("Alias");

    let mut registry = ComponentRegistry::new();
    let error = synthesize(&alias, &output_state(), &mut registry)
        .expect_err("alias has no plain fragment");
    assert!(matches!(
        error,
        SynthError::UnexpectedReferenceFragment { .. }
    ));

    // the alias entry is an orphan; the inner component still completed
    assert_eq!(registry.orphans().len(), 1);
    assert!(registry.schemas().contains_key("Inner"));
}

#[test]
fn synthesizes_a_small_document() {
    let role = SchemaNode::enumeration(["admin", "member", "guest"]).with_name("Role");
    let user = SchemaNode::object(
        ObjectShape::new()
            .field("id", SchemaNode::string_with_format("uuid"))
            .field("role", role.with_default("member"))
            .field("email", SchemaNode::string_with_format("email").optional())
            .field("tags", SchemaNode::record(SchemaNode::string()))
            .strict(),
    )
    .with_name("User");

    let mut registry = ComponentRegistry::new();
    let fragment =
        synthesize(&user, &output_state(), &mut registry).expect("synthesizable schema");

    let RefOr::Ref(reference) = &fragment.schema else {
        panic!("expected a reference for the named root");
    };
    assert_eq!(reference.ref_location, "#/components/schemas/User");

    insta::assert_json_snapshot!(registry.schemas(), @r##"
    {
      "User": {
        "type": "object",
        "properties": {
          "id": {
            "type": "string",
            "format": "uuid"
          },
          "role": {
            "allOf": [
              {
                "$ref": "#/components/schemas/Role"
              }
            ],
            "default": "member"
          },
          "email": {
            "type": "string",
            "format": "email"
          },
          "tags": {
            "type": "object",
            "additionalProperties": {
              "type": "string"
            }
          }
        },
        "required": [
          "id",
          "role",
          "tags"
        ],
        "additionalProperties": false
      },
      "Role": {
        "type": "string",
        "enum": [
          "admin",
          "member",
          "guest"
        ]
      }
    }
    "##);
}
