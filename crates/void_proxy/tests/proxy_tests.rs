//! Integration tests for void_proxy (live component proxies)

use std::sync::Arc;

use void_proxy::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> Arc<ProxyRegistry> {
    init_logging();
    Arc::new(ProxyRegistry::new())
}

fn render_field(field: &'static str) -> impl Fn(&Instance) -> Value + Send + Sync + 'static {
    move |this| this.field(field).cloned().unwrap_or_default()
}

fn counter(step: i64, source: &str) -> ClassComponent {
    ClassComponent::new(source)
        .with_name("Counter")
        .with_fields([("step", Value::Int(step)), ("count", Value::Int(0))])
        .with_render("render() { return this.step }", render_field("step"))
}

fn label(text: &'static str) -> FunctionComponent {
    FunctionComponent::new(format!("function Label() {{ return '{}' }}", text), move |_, _| Value::from(text))
        .with_name("Label")
}

fn empty() -> Value {
    Value::object()
}

#[test]
fn test_wrapper_identity_is_stable_across_updates() {
    let registry = registry();
    let handle = registry.obtain(counter(1, "class Counter { v1 }")).unwrap();
    let wrapper = handle.get();

    handle.update(counter(2, "class Counter { v2 }")).unwrap();
    assert!(handle.get().ptr_eq(&wrapper));

    handle.update(label("switched")).unwrap();
    assert!(handle.get().ptr_eq(&wrapper));

    handle.update(counter(3, "class Counter { v3 }")).unwrap();
    assert_eq!(handle.get(), wrapper);
    assert_eq!(handle.generation(), 4);
}

#[test]
fn test_instances_stay_instances_of_the_wrapper() {
    let registry = registry();
    let handle = registry.obtain(counter(1, "class Counter { v1 }")).unwrap();
    let instance = handle.get().construct(empty(), empty()).unwrap();

    handle.update(label("now a function")).unwrap();
    handle.update(counter(5, "class Counter { v5 }")).unwrap();

    assert!(instance.is_instance_of(&handle.get()));
}

#[test]
fn test_obtain_twice_returns_same_handle() {
    let registry = registry();
    let component = counter(1, "class Counter {}").into_component();

    let first = registry.obtain(component.clone()).unwrap();
    let second = registry.obtain(component).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.generation(), 1);
}

#[test]
fn test_no_double_wrapping() {
    let registry = registry();
    let handle = registry.obtain(label("hi")).unwrap();
    let entries = registry.len();

    let again = registry.obtain(handle.get()).unwrap();

    assert!(again.ptr_eq(&handle));
    assert_eq!(registry.len(), entries);
}

#[test]
fn test_wrapper_cycles_resolve_to_underlying_implementation() {
    let registry = registry();
    let a = registry.obtain(label("a")).unwrap();
    let b = registry.obtain(label("b")).unwrap();

    let report = a.update(b.get()).unwrap();
    assert!(report.is_applied());

    let mut instance = a.get().construct(empty(), empty()).unwrap();
    assert_eq!(instance.render(), Value::from("b"));

    // A now runs B's implementation, so handing A back to B changes nothing.
    let report = b.update(a.get()).unwrap();
    assert_eq!(report.outcome, UpdateOutcome::Unchanged);
    assert_eq!(b.generation(), 1);

    let report = a.update(a.get()).unwrap();
    assert_eq!(report.outcome, UpdateOutcome::Unchanged);
    assert_eq!(a.generation(), 2);
}

#[test]
fn test_statics_follow_the_implementation() {
    let registry = registry();
    let getter = Getter::new(|| Value::from("computed"));

    let first = counter(1, "class Counter { v1 }")
        .with_static("version", 1)
        .with_static("legacy", "old")
        .with_static_descriptor("derived", PropertyDescriptor::accessor(Some(getter), None));
    let handle = registry.obtain(first).unwrap();
    let wrapper = handle.get();

    assert_eq!(wrapper.static_value("derived"), Some(Value::from("computed")));
    wrapper.define_static("own", PropertyDescriptor::data("host"));

    let second = counter(1, "class Counter { v2 }")
        .with_static("version", 2)
        .with_static("added", true);
    handle.update(second).unwrap();

    assert_eq!(wrapper.static_value("version"), Some(Value::Int(2)));
    assert_eq!(wrapper.static_value("added"), Some(Value::Bool(true)));
    assert_eq!(wrapper.static_value("legacy"), None);
    assert_eq!(wrapper.static_value("derived"), None);
    assert_eq!(wrapper.static_value("own"), Some(Value::from("host")));
    assert_eq!(wrapper.static_keys(), vec!["added", "own", "version"]);
}

#[test]
fn test_field_changes_are_injected_lazily() {
    let registry = registry();
    let first = ClassComponent::new("class C { x = 1 }")
        .with_name("C")
        .with_fields([("x", Value::Int(1))])
        .with_render("render() { return this.x }", render_field("x"));
    let handle = registry.obtain(first).unwrap();

    let mut instance = handle.get().construct(empty(), empty()).unwrap();
    assert_eq!(instance.render(), Value::Int(1));

    let second = ClassComponent::new("class C { x = 2 }")
        .with_name("C")
        .with_fields([("x", Value::Int(2))])
        .with_regeneration()
        .with_render("render() { return this.x }", render_field("x"));
    let report = handle.update(second).unwrap();

    assert_eq!(report.injected_fields, vec!["x"]);
    assert!(report.diagnostics.is_empty());

    assert_eq!(instance.field("x"), Some(&Value::Int(1)));
    assert_eq!(instance.generation(), 1);

    assert_eq!(instance.render(), Value::Int(2));
    assert_eq!(instance.field("x"), Some(&Value::Int(2)));
    assert_eq!(instance.generation(), 2);

    // Already in sync: a second render replays nothing.
    instance.set_field("x", 10);
    assert_eq!(instance.render(), Value::Int(10));
}

#[test]
fn test_new_instances_use_the_latest_initializer() {
    let registry = registry();
    let handle = registry.obtain(counter(1, "class Counter { v1 }")).unwrap();
    handle.update(counter(4, "class Counter { v2 }")).unwrap();

    let mut instance = handle.get().construct(empty(), empty()).unwrap();

    assert_eq!(instance.generation(), 2);
    assert_eq!(instance.render(), Value::Int(4));
}

#[test]
fn test_field_change_without_regeneration_is_reported() {
    let registry = registry();
    let handle = registry.obtain(counter(1, "class Counter { v1 }")).unwrap();
    let mut instance = handle.get().construct(empty(), empty()).unwrap();

    let report = handle.update(counter(2, "class Counter { v2 }")).unwrap();

    assert_eq!(report.diagnostics.len(), 1);
    match &report.diagnostics[0] {
        Diagnostic::UnsupportedFieldChange { component, field, value } => {
            assert_eq!(component, "Counter");
            assert_eq!(field, "step");
            assert_eq!(value, "2");
        }
        other => panic!("unexpected diagnostic {:?}", other),
    }
    assert!(report.injected_fields.is_empty());

    // The new render code runs against the stale field.
    assert_eq!(instance.render(), Value::Int(1));
    assert_eq!(instance.generation(), 2);
}

#[test]
fn test_changed_mount_hook_is_reported_not_swapped() {
    let registry = registry();
    let with_hook = |tag: &'static str| {
        ClassComponent::new(format!("class Panel {{ {} }}", tag))
            .with_name("Panel")
            .with_fields([("mounted_by", Value::Null)])
            .with_method(
                "component_will_mount",
                &format!("componentWillMount() {{ this.mountedBy = '{}' }}", tag),
                move |this, _| {
                    this.set_field("mounted_by", tag);
                    Value::Undefined
                },
            )
    };

    let handle = registry.obtain(with_hook("v1")).unwrap();
    let mut existing = handle.get().construct(empty(), empty()).unwrap();

    let report = handle.update(with_hook("v2")).unwrap();

    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        &report.diagnostics[0],
        Diagnostic::UnsupportedLifecycleChange { hook, .. } if hook == "component_will_mount"
    ));

    existing.mount();
    assert_eq!(existing.field("mounted_by"), Some(&Value::from("v1")));
    assert!(existing.hook_source("component_will_mount").unwrap().contains("v1"));

    let mut fresh = handle.get().construct(empty(), empty()).unwrap();
    fresh.mount();
    assert_eq!(fresh.field("mounted_by"), Some(&Value::from("v2")));
}

#[test]
fn test_unmount_hook_changes_are_ignored() {
    let registry = registry();
    let with_unmount = |body: &str| {
        ClassComponent::new("class Panel {}")
            .with_name("Panel")
            .with_method("component_will_unmount", body, |_, _| Value::Undefined)
    };

    let handle = registry.obtain(with_unmount("componentWillUnmount() { a() }")).unwrap();
    let report = handle.update(with_unmount("componentWillUnmount() { b() }")).unwrap();

    assert!(report.is_applied());
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_display_name_fallback() {
    let registry = registry();

    let anonymous = registry.obtain(ClassComponent::new("class {}")).unwrap();
    assert_eq!(anonymous.get().display_name(), "Unknown");

    let placeholder = registry
        .obtain(ClassComponent::new("class Component {}").with_name("Component"))
        .unwrap();
    assert_eq!(placeholder.get().display_name(), "Unknown");

    let widget = registry.obtain(ClassComponent::new("class Widget {}").with_name("Widget")).unwrap();
    assert_eq!(widget.get().display_name(), "Widget");
    assert_eq!(widget.get().name(), "Widget");

    widget
        .update(ClassComponent::new("class Widget {}").with_name("Widget").with_display_name("FancyWidget"))
        .unwrap();
    assert_eq!(widget.get().display_name(), "FancyWidget");
}

#[test]
fn test_wrapper_prints_current_source() {
    let registry = registry();
    let handle = registry.obtain(label("one")).unwrap();
    assert_eq!(handle.get().to_string(), "function Label() { return 'one' }");

    handle.update(label("two")).unwrap();
    assert_eq!(handle.get().to_string(), "function Label() { return 'two' }");
}

#[test]
fn test_switching_between_function_and_class() {
    let registry = registry();
    let handle = registry.obtain(label("from function")).unwrap();
    let mut instance = handle.get().construct(empty(), empty()).unwrap();
    assert_eq!(instance.render(), Value::from("from function"));

    let class = ClassComponent::new("class Label {}")
        .with_name("Label")
        .with_render("render() { return this.props.text }", |this| {
            this.props().get("text").cloned().unwrap_or_default()
        });
    handle.update(class).unwrap();
    assert!(handle.get().is_class());

    instance.set_props(Value::object_from([("text", Value::from("from class"))]));
    assert_eq!(instance.render(), Value::from("from class"));

    let report = handle.update(label("back again")).unwrap();
    assert!(report.injected_fields.is_empty());
    assert!(!handle.get().is_class());
    assert_eq!(instance.render(), Value::from("back again"));
}

#[test]
fn test_function_components_receive_props_and_context() {
    let registry = registry();
    let greeting = FunctionComponent::new("function Greeting(props, context) {}", |props, context| {
        let name = props.get("name").map(Value::to_text).unwrap_or_default();
        let locale = context.get("locale").map(Value::to_text).unwrap_or_default();
        Value::from(format!("{}:{}", locale, name))
    });
    let handle = registry.obtain(greeting).unwrap();

    let mut instance = handle
        .get()
        .construct(
            Value::object_from([("name", Value::from("Ada"))]),
            Value::object_from([("locale", Value::from("en"))]),
        )
        .unwrap();

    assert_eq!(instance.render(), Value::from("en:Ada"));
}

#[test]
fn test_methods_resolve_through_current_implementation() {
    let registry = registry();
    let with_increment = |by: i64, source: &str| {
        counter(1, source).with_method("increment", "increment() { this.count += by }", move |this, _| {
            let count = this.field("count").and_then(Value::as_int).unwrap_or(0) + by;
            this.set_field("count", count);
            Value::Int(count)
        })
    };

    let handle = registry.obtain(with_increment(1, "class Counter { v1 }")).unwrap();
    let mut instance = handle.get().construct(empty(), empty()).unwrap();
    assert_eq!(instance.invoke("increment", &[]), Some(Value::Int(1)));

    handle.update(with_increment(10, "class Counter { v2 }")).unwrap();
    assert_eq!(instance.invoke("increment", &[]), Some(Value::Int(11)));
    assert_eq!(instance.invoke("missing", &[]), None);
}

#[test]
fn test_probe_failure_does_not_abort_update() {
    let registry = registry();
    let handle = registry.obtain(counter(1, "class Counter { v1 }")).unwrap();

    let needs_props = ClassComponent::new("class Counter { v2 }")
        .with_name("Counter")
        .with_initializer(|props, _| {
            props
                .get("start")
                .map(|start| [("count".to_string(), start.clone())].into_iter().collect())
                .ok_or_else(|| "start is required".to_string())
        })
        .with_render("render() { return this.count }", render_field("count"));

    let report = handle.update(needs_props).unwrap();

    assert!(report.is_applied());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.generation, 2);
}

#[test]
fn test_invalid_implementation_is_rejected() {
    let registry = registry();
    let handle = registry.obtain(label("x")).unwrap();

    for value in [Value::Null, Value::Int(1), Value::from("Label"), Value::object()] {
        assert!(matches!(
            handle.update(value),
            Err(ProxyError::InvalidImplementation { .. })
        ));
    }
    assert_eq!(handle.generation(), 1);
}

#[test]
fn test_diffing_can_be_disabled() {
    init_logging();
    let config = ProxyConfig {
        diff_fields: false,
        diff_lifecycle: false,
        ..ProxyConfig::default()
    };
    let registry = Arc::new(ProxyRegistry::with_config(config));
    let handle = registry.obtain(counter(1, "class Counter { v1 }")).unwrap();

    let report = handle.update(counter(2, "class Counter { v2 }")).unwrap();

    assert!(report.diagnostics.is_empty());
    assert!(report.injected_fields.is_empty());
}

#[test]
fn test_text_diff_misses_object_changes() {
    // Known approximation: every object prints as `[object Object]`.
    let registry = registry();
    let styled = |color: &str| {
        ClassComponent::new("class Box {}")
            .with_name("Box")
            .with_fields([("style", Value::object_from([("color", Value::from(color))]))])
    };
    let handle = registry.obtain(styled("red")).unwrap();

    let report = handle.update(styled("blue")).unwrap();

    assert!(report.is_applied());
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_custom_fallback_name() {
    init_logging();
    let registry = Arc::new(ProxyRegistry::with_config(
        ProxyConfig::default().with_fallback_name("Anonymous").with_placeholder("PureComponent"),
    ));

    let handle = registry
        .obtain(ClassComponent::new("class PureComponent {}").with_name("PureComponent"))
        .unwrap();

    assert_eq!(handle.get().display_name(), "Anonymous");
}
