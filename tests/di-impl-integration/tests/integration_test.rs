//! 组合根端到端集成测试
use anyhow::Result;
use async_trait::async_trait;
use companion_common::{
    BoxError, Component, ComponentId, ComponentInstance, CompositionError,
    DependencyError, HookResult, HookStage, LifecycleError, ManagerState, RegistrationError,
};
use companion_di::{ComponentManager, SharedContext, SHARED_CONTEXT_ID};
use companion_di_abstractions::{
    component_factory, ComponentArgs, ComponentDefinition, ComponentDescriptor, ComponentLookup,
    ComponentRegistry, ParamSpec,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Journal = Arc<Mutex<Vec<String>>>;

/// 测试组件：记录钩子调用并保存收到的依赖实例
#[derive(Debug)]
struct Node {
    id: ComponentId,
    journal: Journal,
    dependencies: Vec<ComponentInstance>,
    fail_on: Option<HookStage>,
}

impl Node {
    fn record(&self, stage: HookStage) -> HookResult {
        self.journal.lock().push(format!("{}:{}", stage, self.id));
        if self.fail_on == Some(stage) {
            return Err(format!("{} 在 {} 阶段失败", self.id, stage).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Component for Node {
    async fn on_init(&self) -> HookResult {
        self.record(HookStage::Init)
    }

    async fn on_finish(&self) -> HookResult {
        self.record(HookStage::Finish)
    }

    async fn on_dispose(&self) -> HookResult {
        self.record(HookStage::Dispose)
    }
}

/// 测试夹具
struct Fixture {
    manager: ComponentManager,
    journal: Journal,
    constructed: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            manager: ComponentManager::new(),
            journal: Journal::default(),
            constructed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn descriptor(
        &self,
        id: &'static str,
        priority: i32,
        deps: &[&'static str],
        fail_on: Option<HookStage>,
    ) -> ComponentDescriptor {
        let journal = Arc::clone(&self.journal);
        let constructed = Arc::clone(&self.constructed);
        deps.iter()
            .fold(
                ComponentDescriptor::builder(id).priority(priority),
                |builder, dep| builder.depends_on(*dep),
            )
            .build(move |args: ComponentArgs| {
                constructed.fetch_add(1, Ordering::SeqCst);
                let dependencies = (0..args.len())
                    .map(|index| args.instance(index))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, BoxError>(Node {
                    id: args.component_id().clone(),
                    journal: Arc::clone(&journal),
                    dependencies,
                    fail_on,
                })
            })
    }

    fn add(&mut self, id: &'static str, priority: i32, deps: &[&'static str]) -> &mut Self {
        let descriptor = self.descriptor(id, priority, deps, None);
        self.manager.register(descriptor, None).unwrap();
        self
    }

    fn add_failing(
        &mut self,
        id: &'static str,
        deps: &[&'static str],
        stage: HookStage,
    ) -> &mut Self {
        let descriptor = self.descriptor(id, 0, deps, Some(stage));
        self.manager.register(descriptor, None).unwrap();
        self
    }

    fn hooks(&self, stage: HookStage) -> Vec<String> {
        let prefix = format!("{}:", stage);
        self.journal
            .lock()
            .iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    fn order(&self) -> Vec<&str> {
        self.manager
            .initialization_order()
            .iter()
            .map(ComponentId::as_str)
            .collect()
    }
}

#[tokio::test]
async fn test_end_to_end_order_and_reverse_dispose() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture
        .add("A", 0, &[])
        .add("B", 5, &["A"])
        .add("C", 1, &["A"])
        .add("D", 0, &["B", "C"]);

    fixture.manager.setup().await?;
    assert_eq!(fixture.order(), ["A", "B", "C", "D"]);
    assert_eq!(fixture.hooks(HookStage::Init), ["A", "B", "C", "D"]);
    assert_eq!(fixture.hooks(HookStage::Finish), ["A", "B", "C", "D"]);

    fixture.manager.dispose().await?;
    assert_eq!(fixture.hooks(HookStage::Dispose), ["D", "C", "B", "A"]);
    Ok(())
}

#[tokio::test]
async fn test_every_dependency_precedes_its_dependents() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture
        .add("tray", 0, &["window", "notifier"])
        .add("window", 2, &["settings", "logger"])
        .add("notifier", 1, &["remote-config", "logger"])
        .add("remote-config", 4, &["settings", "logger"])
        .add("settings", 0, &["logger"])
        .add("logger", 9, &[])
        .add("standalone", 0, &[]);

    fixture.manager.setup().await?;
    let order = fixture.order();
    assert_eq!(order.len(), 7);

    let position = |id: &str| order.iter().position(|o| *o == id).unwrap();
    let registry = fixture.manager.registry();
    for id in registry.ids() {
        for dep in registry.lookup(id.as_str()).unwrap().dependency_ids() {
            assert!(position(dep.as_str()) < position(id.as_str()));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_duplicate_id_leaves_registry_unchanged() {
    let mut fixture = Fixture::new();
    fixture.add("logger", 3, &[]);

    let duplicate = fixture.descriptor("logger", 7, &["settings"], None);
    let err = fixture.manager.register(duplicate, None).unwrap_err();

    assert!(matches!(err, RegistrationError::DuplicateId { ref id } if id == "logger"));
    assert_eq!(fixture.manager.registry().len(), 1);
    let kept = fixture.manager.lookup("logger").unwrap();
    assert_eq!(kept.priority, 3);
    assert_eq!(kept.dependency_ids().count(), 0);
}

#[tokio::test]
async fn test_unregistered_dependency_is_named() {
    let mut fixture = Fixture::new();
    fixture.add("self-update", 0, &["remote-config"]);

    let err = fixture.manager.setup().await.unwrap_err();
    let CompositionError::Dependency { source } = err else {
        panic!("期望依赖错误");
    };
    assert!(
        matches!(source, DependencyError::UnregisteredDependency { ref id } if id == "remote-config")
    );
    assert_eq!(fixture.manager.state(), ManagerState::Unconfigured);
    assert!(fixture.manager.get_instance("self-update").is_none());
}

#[tokio::test]
async fn test_cycle_reports_path() {
    let mut fixture = Fixture::new();
    fixture.add("A", 0, &["B"]).add("B", 0, &["A"]);

    let err = fixture.manager.setup().await.unwrap_err();
    let CompositionError::Dependency { source } = err else {
        panic!("期望依赖错误");
    };
    let path = source.cycle_path().unwrap();
    assert!(path.iter().any(|id| id == "A"));
    assert!(path.iter().any(|id| id == "B"));
    assert_eq!(path.first(), path.last());
    assert!(source.to_string().contains("->"));
    assert_eq!(fixture.constructed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_diamond_shares_single_instance() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture
        .add("A", 0, &["B", "C"])
        .add("B", 0, &["D"])
        .add("C", 0, &["D"])
        .add("D", 0, &[]);

    fixture.manager.setup().await?;
    assert_eq!(fixture.constructed.load(Ordering::SeqCst), 4);

    let b = fixture.manager.get::<Node>("B").unwrap();
    let c = fixture.manager.get::<Node>("C").unwrap();
    let d = fixture.manager.get_instance("D").unwrap();
    assert!(Arc::ptr_eq(&b.dependencies[0], &c.dependencies[0]));
    assert!(Arc::ptr_eq(&b.dependencies[0], &d));
    Ok(())
}

#[tokio::test]
async fn test_priority_orders_sibling_subtrees() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture
        .add("Z", 0, &["Y", "X"])
        .add("Y", 1, &["Y1"])
        .add("Y1", 0, &[])
        .add("X", 10, &["X1"])
        .add("X1", 0, &[]);

    fixture.manager.setup().await?;
    assert_eq!(fixture.order(), ["X1", "X", "Y1", "Y", "Z"]);
    Ok(())
}

#[tokio::test]
async fn test_equal_priority_keeps_declaration_order() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture
        .add("Z", 0, &["third", "first", "second"])
        .add("first", 0, &[])
        .add("second", 0, &[])
        .add("third", 0, &[]);

    fixture.manager.setup().await?;
    assert_eq!(fixture.order(), ["third", "first", "second", "Z"]);
    Ok(())
}

#[tokio::test]
async fn test_instances_are_gone_after_dispose() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.add("A", 0, &[]).add("B", 0, &["A"]);

    fixture.manager.setup().await?;
    assert!(fixture.manager.get_instance("A").is_some());

    fixture.manager.dispose().await?;
    for id in ["A", "B", SHARED_CONTEXT_ID.as_str()] {
        assert!(fixture.manager.get_instance(id).is_none());
    }
    assert!(fixture.manager.initialization_order().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_state_machine_guards() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.add("A", 0, &[]);

    assert!(matches!(
        fixture.manager.dispose().await,
        Err(LifecycleError::NotSetup)
    ));

    fixture.manager.setup().await?;
    assert!(matches!(
        fixture.manager.setup().await,
        Err(CompositionError::Lifecycle {
            source: LifecycleError::AlreadySetup
        })
    ));

    fixture.manager.dispose().await?;
    assert!(matches!(
        fixture.manager.dispose().await,
        Err(LifecycleError::NotSetup)
    ));
    Ok(())
}

#[tokio::test]
async fn test_reentry_constructs_fresh_instances() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.add("A", 0, &[]).add("B", 0, &["A"]);

    fixture.manager.setup().await?;
    let first = fixture.manager.get_instance("A").unwrap();
    let first_cycle = fixture.manager.cycle().unwrap().id;
    fixture.manager.dispose().await?;

    fixture.manager.setup().await?;
    let second = fixture.manager.get_instance("A").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(fixture.manager.cycle().unwrap().id, first_cycle);
    assert_eq!(fixture.constructed.load(Ordering::SeqCst), 4);
    assert_eq!(fixture.hooks(HookStage::Init), ["A", "B", "A", "B"]);

    fixture.manager.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_failing_init_aborts_remaining_hooks() {
    let mut fixture = Fixture::new();
    fixture
        .add("logger", 0, &[])
        .add_failing("remote-config", &["logger"], HookStage::Init)
        .add("self-update", 0, &["remote-config"]);

    let err = fixture.manager.setup().await.unwrap_err();
    let CompositionError::Lifecycle {
        source: LifecycleError::Hook { stage, id, source },
    } = err
    else {
        panic!("期望钩子错误");
    };

    assert_eq!(stage, HookStage::Init);
    assert_eq!(id, "remote-config");
    assert!(source.to_string().contains("remote-config"));
    assert_eq!(fixture.hooks(HookStage::Init), ["logger", "remote-config"]);
    assert!(fixture.hooks(HookStage::Finish).is_empty());
    assert!(!fixture.manager.is_ready());
}

#[tokio::test]
async fn test_dispose_continues_past_failures() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture
        .add("A", 0, &[])
        .add_failing("B", &["A"], HookStage::Dispose)
        .add("C", 0, &["B"]);

    fixture.manager.setup().await?;
    let err = fixture.manager.dispose().await.unwrap_err();

    let LifecycleError::DisposeFailed { failures } = err else {
        panic!("期望销毁错误");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "B");
    assert_eq!(fixture.hooks(HookStage::Dispose), ["C", "B", "A"]);
    assert_eq!(fixture.manager.state(), ManagerState::Unconfigured);
    Ok(())
}

/// 运行时通过共享上下文按 ID 查找其他组件
#[derive(Debug)]
struct TrayMenu {
    context: Arc<SharedContext>,
    found_updater: Mutex<Option<bool>>,
}

#[async_trait]
impl Component for TrayMenu {
    async fn on_init(&self) -> HookResult {
        let found = self.context.get::<Node>("self-update").is_some();
        *self.found_updater.lock() = Some(found);
        Ok(())
    }
}

#[tokio::test]
async fn test_shared_context_looks_up_components_by_id() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.manager.register_external(
        "tray-menu",
        None,
        vec![SHARED_CONTEXT_ID],
        component_factory(|args| {
            let context = args.dependency::<SharedContext>(0)?;
            // 构造期间实例表尚未发布
            assert!(context.get_instance("self-update").is_none());
            Ok(TrayMenu {
                context,
                found_updater: Mutex::new(None),
            })
        }),
        None,
    )?;
    fixture.add("self-update", 0, &[]);

    fixture.manager.setup().await?;
    assert_eq!(fixture.order(), ["tray-menu", "self-update"]);

    let tray = fixture.manager.get::<TrayMenu>("tray-menu").unwrap();
    assert_eq!(*tray.found_updater.lock(), Some(true));
    assert!(Arc::ptr_eq(
        &tray.context,
        &fixture
            .manager
            .get::<SharedContext>(SHARED_CONTEXT_ID.as_str())
            .unwrap()
    ));

    fixture.manager.dispose().await?;
    assert!(tray.context.get_instance("self-update").is_none());
    Ok(())
}

#[derive(Debug, Deserialize)]
struct NotifierOptions {
    endpoint: String,
    #[serde(default)]
    interval_secs: u64,
}

/// 通过关联常量声明的组件
#[derive(Debug)]
struct Notifier {
    options: NotifierOptions,
    logger: Arc<Node>,
}

impl Component for Notifier {}

impl ComponentDefinition for Notifier {
    const ID: ComponentId = ComponentId::from_static("notifier");
    const PRIORITY: i32 = 2;

    fn params() -> Vec<ParamSpec> {
        vec![ParamSpec::ConfigSlot, ParamSpec::dependency("logger")]
    }

    fn construct(args: ComponentArgs) -> Result<Self, BoxError> {
        let options = args
            .config::<NotifierOptions>()?
            .ok_or_else(|| BoxError::from("缺少通知配置"))?;
        Ok(Self {
            options,
            logger: args.dependency::<Node>(1)?,
        })
    }
}

#[tokio::test]
async fn test_config_reaches_config_slot() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.add("logger", 0, &[]);
    fixture.manager.register_component::<Notifier>(Some(
        serde_json::json!({ "endpoint": "https://example.invalid/notices" }).into(),
    ))?;

    fixture.manager.setup().await?;
    let notifier = fixture.manager.get::<Notifier>("notifier").unwrap();
    assert_eq!(notifier.options.endpoint, "https://example.invalid/notices");
    assert_eq!(notifier.options.interval_secs, 0);
    assert_eq!(notifier.logger.id, "logger");

    fixture.manager.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_registration_locked_while_ready() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.add("A", 0, &[]);
    fixture.manager.setup().await?;

    let late = fixture.descriptor("late", 0, &[], None);
    assert!(matches!(
        fixture.manager.register(late, None),
        Err(RegistrationError::RegistryLocked { .. })
    ));

    fixture.manager.dispose().await?;
    let late = fixture.descriptor("late", 0, &["A"], None);
    fixture.manager.register(late, None)?;
    fixture.manager.setup().await?;
    assert_eq!(fixture.order(), ["A", "late"]);
    Ok(())
}
