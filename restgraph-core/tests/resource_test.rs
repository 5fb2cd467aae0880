use mock_transport::{
    MockTransport, authors_descriptor, collection, comments_descriptor, contents_descriptor,
    variants_descriptor,
};
use restgraph_core::{RelationshipError, Resource, ResourceError, ValidationCode};
use serde_json::json;


#[test]
fn test_new_resource_derives_ref() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);

    let resource = contents.new_resource(json!({ "owner": "acme", "name": "x" }));

    assert_eq!(resource.reference(), Some("acme:x"));
    assert!(resource.is_new());
}

#[test]
fn test_new_resource_defaults_owner_to_tenant() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);

    let resource = contents.new_resource(json!({ "name": "intro" }));
    assert_eq!(resource.owner(), Some("acme"));
    assert_eq!(resource.reference(), Some("acme:intro"));

    let explicit = contents.new_resource(json!({ "ref": "other:1", "name": "intro" }));
    assert_eq!(explicit.reference(), Some("other:1"));
}

#[test]
fn test_to_json_emits_declared_fields_with_defaults() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);

    let mut resource = contents.new_resource(json!({ "name": "intro", "unknown": true }));
    resource.set("status", serde_json::Value::Null);

    let json = resource.to_json();
    let object = json.as_object().unwrap();

    assert_eq!(object.len(), contents_descriptor().fields.len());
    assert_eq!(object["name"], "intro");
    assert_eq!(object["status"], "draft");
    assert_eq!(object["variantRefs"], serde_json::Value::Null);
    assert!(!object.contains_key("unknown"));
}

#[test]
fn test_unbound_to_json_returns_raw_data() {
    let resource = Resource::from_value(json!({ "ref": "acme:x", "anything": 1 }));
    assert_eq!(resource.to_json(), json!({ "ref": "acme:x", "anything": 1 }));
}

#[test]
fn test_serialise_wraps_in_plural_envelope() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);
    let resource = contents.new_resource(json!({ "name": "intro" }));

    let envelope = resource.serialise().unwrap();

    assert_eq!(envelope["contents"].as_array().unwrap().len(), 1);
    assert_eq!(envelope["contents"][0]["ref"], "acme:intro");
}

#[test]
fn test_unbound_resource_has_no_endpoint() {
    let mut resource = Resource::from_value(json!({ "ref": "acme:x" }));

    assert!(matches!(
        resource.serialise(),
        Err(ResourceError::NoEndpoint)
    ));
    assert!(matches!(
        resource.validate_field("name"),
        Err(ResourceError::NoEndpoint)
    ));
    assert!(matches!(resource.validate(), Err(ResourceError::NoEndpoint)));
}

#[tokio::test]
async fn test_unbound_resource_cannot_persist() {
    let mut resource = Resource::from_value(json!({ "ref": "acme:x" }));

    assert!(matches!(
        resource.save().await,
        Err(ResourceError::NoEndpoint)
    ));
    assert!(matches!(
        resource.destroy().await,
        Err(ResourceError::NoEndpoint)
    ));
}

#[test]
fn test_validate_field_codes() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);
    let resource = contents.new_resource(json!({
        "name": "Not Valid",
        "status": "archived",
        "tags": { "Upper": "maybe", "fine": "yes" }
    }));

    let name = resource.validate_field("name").unwrap();
    assert_eq!(name.code, ValidationCode::InvalidValue);
    assert!(!name.valid);

    let status = resource.validate_field("status").unwrap();
    assert_eq!(status.code, ValidationCode::NotAllowed);

    let tags = resource.validate_field("tags").unwrap();
    assert_eq!(tags.code, ValidationCode::InvalidMap);
    assert!(tags.message.contains("Upper"));
    assert!(tags.message.contains("; "));

    let unknown = resource.validate_field("unknown").unwrap();
    assert_eq!(unknown.code, ValidationCode::NoField);

    let owner = resource.validate_field("owner").unwrap();
    assert!(owner.valid);
    assert_eq!(owner.code, ValidationCode::None);
}

#[test]
fn test_validate_collects_failures() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);

    let mut resource = contents.new_resource(json!({ "status": "live" }));

    let Err(ResourceError::Invalid(errors)) = resource.validate() else {
        panic!("expected a validation failure");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "name");
    assert_eq!(errors[0].code, ValidationCode::RequiredField);
    assert_eq!(resource.errors(), errors.as_slice());

    resource.set("name", "intro");
    assert!(resource.validate().is_ok());
    assert!(resource.errors().is_empty());
}

#[test]
fn test_direct_link_appends_without_duplicates() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);
    let variants = collection(variants_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut variant = variants.new_resource(json!({ "name": "v1" }));

    content.link(&mut variant, None).unwrap();
    content.link(&mut variant, None).unwrap();

    assert_eq!(content.get("variantRefs"), Some(&json!(["acme:v1"])));
}

#[test]
fn test_direct_link_many() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);
    let variants = collection(variants_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut batch = vec![
        variants.new_resource(json!({ "name": "v1" })),
        variants.new_resource(json!({ "name": "v2" })),
    ];

    content.link(&mut batch, None).unwrap();

    assert_eq!(
        content.get("variantRefs"),
        Some(&json!(["acme:v1", "acme:v2"]))
    );
    assert!(content.pending_links().is_empty());
}

#[test]
fn test_direct_link_to_single_ref_field_overwrites() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);
    let authors = collection(authors_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut batch = vec![
        authors.new_resource(json!({ "name": "ann" })),
        authors.new_resource(json!({ "name": "bob" })),
    ];

    content.link(&mut batch, None).unwrap();

    assert_eq!(content.get("authorRef"), Some(&json!("acme:bob")));
}

#[test]
fn test_link_by_relationship_name_accepts_unbound_target() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut author = Resource::from_value(json!({ "ref": "acme:ann" }));

    content.link(&mut author, Some("author")).unwrap();

    assert_eq!(content.get("authorRef"), Some(&json!("acme:ann")));
}

#[test]
fn test_link_errors() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut unbound = Resource::from_value(json!({ "ref": "acme:ann" }));

    assert!(matches!(
        content.link(&mut unbound, None),
        Err(ResourceError::Relationship(
            RelationshipError::UnknownTargetType
        ))
    ));
    assert!(matches!(
        content.link(&mut unbound, Some("nope")),
        Err(ResourceError::Relationship(RelationshipError::NotFound(_)))
    ));

    let mut no_ref = Resource::from_value(json!({ "name": "ann" }));
    assert!(matches!(
        content.link(&mut no_ref, Some("author")),
        Err(ResourceError::MissingRef)
    ));
}

#[test]
fn test_indirect_link_writes_on_target_and_queues_it() {
    let transport = MockTransport::new();
    let contents = collection(contents_descriptor(), &transport);
    let comments = collection(comments_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut comment = comments.new_resource(json!({ "name": "first" }));

    content.link(&mut comment, None).unwrap();

    assert_eq!(comment.get("contentRef"), Some(&json!("acme:intro")));
    assert_eq!(content.pending_links().len(), 1);
    assert_eq!(
        content.pending_links()[0].get("contentRef"),
        Some(&json!("acme:intro"))
    );
}

#[tokio::test]
async fn test_save_persists_links_before_self() {
    let transport = MockTransport::new();
    transport
        .on(
            "POST",
            "/content-comments",
            json!({ "comments": [{ "ref": "acme:first", "contentRef": "acme:intro" }] }),
        )
        .on(
            "POST",
            "/contents",
            json!({ "contents": [{ "ref": "acme:intro", "name": "intro", "status": "draft" }] }),
        );
    let contents = collection(contents_descriptor(), &transport);
    let comments = collection(comments_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let mut comment = comments.new_resource(json!({ "name": "first" }));
    content.link(&mut comment, None).unwrap();

    let saved = content.save().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].url.contains("/content-comments?owner=acme"));
    assert!(calls[1].url.contains("/contents?owner=acme"));
    assert_eq!(
        calls[0].body.as_ref().unwrap()["comments"][0]["contentRef"],
        "acme:intro"
    );

    assert_eq!(saved.reference(), Some("acme:intro"));
    assert!(!saved.is_new());
    assert!(content.pending_links().is_empty());
}

#[tokio::test]
async fn test_save_updates_existing_resource() {
    let transport = MockTransport::new();
    transport.on(
        "PUT",
        "/contents/acme:intro",
        json!({ "contents": [{ "ref": "acme:intro", "name": "renamed" }] }),
    );
    let contents = collection(contents_descriptor(), &transport);

    let mut content = contents.resource(json!({ "ref": "acme:intro", "name": "intro" }));
    content.set("name", "renamed");

    let saved = content.save().await.unwrap();

    let calls = transport.calls_to("PUT");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].url,
        "https://api.example.com/content/contents/acme:intro?owner=acme"
    );
    assert_eq!(
        calls[0].body.as_ref().unwrap()["contents"][0]["name"],
        "renamed"
    );
    assert_eq!(saved.name(), Some("renamed"));
}

#[tokio::test]
async fn test_save_keeps_data_when_service_echoes_nothing() {
    let transport = MockTransport::new();
    transport.on("POST", "/contents", json!({}));
    let contents = collection(contents_descriptor(), &transport);

    let mut content = contents.new_resource(json!({ "name": "intro" }));
    let saved = content.save().await.unwrap();

    assert_eq!(saved.reference(), Some("acme:intro"));
    assert!(!saved.is_new());
}

#[tokio::test]
async fn test_destroy_deletes_by_ref() {
    let transport = MockTransport::new();
    transport.on("DELETE", "/contents/acme:intro", json!({}));
    let contents = collection(contents_descriptor(), &transport);

    let content = contents.resource(json!({ "ref": "acme:intro" }));
    content.destroy().await.unwrap();

    let calls = transport.calls_to("DELETE");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].url,
        "https://api.example.com/content/contents/acme:intro?owner=acme"
    );
}

#[test]
fn test_has_linked() {
    let mut resource = Resource::from_value(json!({ "ref": "acme:x" }));
    assert!(!resource.has_linked("assets"));

    resource.set_linked("assets", vec![]);
    assert!(!resource.has_linked("assets"));

    resource.set_linked("assets", vec![json!({ "ref": "acme:a" })]);
    assert!(resource.has_linked("assets"));
    assert_eq!(resource.linked("assets").len(), 1);
}
