//! 组件管理器
//!
//! 生命周期编排：注入共享上下文、一次性解析整张依赖图、按初始化顺序执行
//! `on_init` 与 `on_finish`，销毁时逆序执行 `on_dispose` 并清空实例表。

use crate::instances::InstanceTable;
use crate::registry::DescriptorRegistry;
use crate::resolver::DependencyResolver;
use crate::root::{is_reserved_id, root_descriptor, SYNTHETIC_ROOT_ID};
use crate::shared::{
    shared_context_descriptor, SetupCycle, SharedContext, SharedGlobals, SHARED_CONTEXT_ID,
};
use companion_common::{
    ComponentId, ComponentInstance, CompositionResult, ConfigSection, HookFailure, HookResult,
    HookStage, LifecycleError, LifecycleResult, ManagerState, RegistrationError,
    RegistrationResult,
};
use companion_di_abstractions::{ComponentDescriptor, ComponentLookup, ComponentRegistry};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};

/// 组件管理器
///
/// 持有注册表、实例表与初始化顺序。`setup` 与 `dispose` 需要 `&mut self`，
/// 因此同一时刻只会有一个生命周期过程在运行。
#[derive(Debug, Default)]
pub struct ComponentManager {
    registry: DescriptorRegistry,
    instances: Arc<RwLock<InstanceTable>>,
    order: Vec<ComponentId>,
    state: ManagerState,
    globals: SharedGlobals,
    cycle: Option<SetupCycle>,
}

impl ComponentManager {
    /// 创建新的组件管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用已有的进程级共享存储创建管理器
    pub fn with_globals(globals: SharedGlobals) -> Self {
        Self {
            globals,
            ..Self::default()
        }
    }

    /// 启动所有已注册组件
    ///
    /// 解析失败时本次启动中构造的实例全部丢弃；钩子失败时已构造的实例保留，
    /// 状态仍为 `Unconfigured`，不做回滚。
    pub async fn setup(&mut self) -> CompositionResult<()> {
        if self.state.is_ready() {
            return Err(LifecycleError::AlreadySetup.into());
        }

        let cycle = SetupCycle::new();
        let span = info_span!("setup", cycle = %cycle.id);
        self.run_setup(cycle).instrument(span).await
    }

    async fn run_setup(&mut self, cycle: SetupCycle) -> CompositionResult<()> {
        info!("开始启动组合根，已注册组件 {} 个", self.registry.len());

        // 上一次失败的启动可能留下实例
        self.order.clear();
        self.instances.write().clear();
        self.cycle = None;

        let (table, order) = self.resolve_all(&cycle)?;
        info!("依赖解析完成，共构造 {} 个组件", order.len());
        debug!("初始化顺序: {:?}", order);

        *self.instances.write() = table;
        self.order = order;
        self.cycle = Some(cycle);

        self.run_hooks(HookStage::Init).await?;
        self.run_hooks(HookStage::Finish).await?;

        self.state = ManagerState::Ready;
        info!("组合根启动完成");
        Ok(())
    }

    /// 注入共享上下文与合成根，执行一次完整解析
    ///
    /// 解析在局部实例表上进行，期间共享上下文查不到任何组件。
    fn resolve_all(
        &mut self,
        cycle: &SetupCycle,
    ) -> CompositionResult<(InstanceTable, Vec<ComponentId>)> {
        let context = Arc::new(SharedContext::new(
            Arc::downgrade(&self.instances),
            self.globals.clone(),
            cycle.clone(),
        ));

        let mut table = InstanceTable::new();
        table.insert(SHARED_CONTEXT_ID, Arc::clone(&context) as ComponentInstance);

        let dependencies: Vec<ComponentId> = self
            .registry
            .ids()
            .filter(|id| !is_reserved_id(id))
            .cloned()
            .collect();

        self.registry
            .insert_internal(shared_context_descriptor(context));
        self.registry.insert_internal(root_descriptor(dependencies));

        let resolved =
            DependencyResolver::new(&self.registry, &mut table).resolve_root(&SYNTHETIC_ROOT_ID);

        self.registry.remove_internal(&SYNTHETIC_ROOT_ID);
        self.registry.remove_internal(&SHARED_CONTEXT_ID);

        let (_, mut order) = resolved.map_err(|err| {
            error!("依赖解析失败: {}", err);
            err
        })?;

        order.retain(|id| *id != SYNTHETIC_ROOT_ID);
        table.remove(SYNTHETIC_ROOT_ID.as_str());

        Ok((table, order))
    }

    /// 按初始化顺序执行某一阶段的钩子，遇到失败立即中止
    async fn run_hooks(&self, stage: HookStage) -> LifecycleResult<()> {
        debug!("执行 {} 钩子", stage);

        for id in &self.order {
            let Some(instance) = self.instance(id) else {
                continue;
            };

            if let Err(source) = invoke_hook(&instance, stage).await {
                error!("组件 {} 的 {} 钩子执行失败: {}", id, stage, source);
                return Err(LifecycleError::Hook {
                    stage,
                    id: id.clone(),
                    source,
                });
            }
        }

        Ok(())
    }

    /// 逆序销毁所有组件
    ///
    /// 单个 `on_dispose` 失败不会中断销毁过程；所有失败在实例表清空后
    /// 通过 `DisposeFailed` 一并返回。
    pub async fn dispose(&mut self) -> LifecycleResult<()> {
        if !self.state.is_ready() {
            return Err(LifecycleError::NotSetup);
        }

        let cycle = self.cycle.as_ref().map(|cycle| cycle.id);
        let span = info_span!("dispose", cycle = ?cycle);
        self.run_dispose().instrument(span).await
    }

    async fn run_dispose(&mut self) -> LifecycleResult<()> {
        info!("开始销毁组件，共 {} 个", self.order.len());

        let mut failures = Vec::new();
        for id in self.order.iter().rev() {
            let Some(instance) = self.instance(id) else {
                continue;
            };

            if let Err(source) = invoke_hook(&instance, HookStage::Dispose).await {
                error!("组件 {} 销毁失败: {}", id, source);
                failures.push(HookFailure {
                    id: id.clone(),
                    stage: HookStage::Dispose,
                    source,
                });
            }
        }

        self.instances.write().clear();
        self.order.clear();
        self.cycle = None;
        self.state = ManagerState::Unconfigured;

        if failures.is_empty() {
            info!("组件销毁完成");
            Ok(())
        } else {
            Err(LifecycleError::DisposeFailed { failures })
        }
    }

    fn instance(&self, id: &ComponentId) -> Option<ComponentInstance> {
        self.instances.read().get(id.as_str()).cloned()
    }

    /// 最近一次启动计算出的初始化顺序，不含合成根与共享上下文
    pub fn initialization_order(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// 进程级共享存储，跨启动周期保留
    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    /// 当前启动周期，未启动时为 `None`
    pub fn cycle(&self) -> Option<&SetupCycle> {
        self.cycle.as_ref()
    }
}

async fn invoke_hook(instance: &ComponentInstance, stage: HookStage) -> HookResult {
    match stage {
        HookStage::Init => instance.on_init().await,
        HookStage::Finish => instance.on_finish().await,
        HookStage::Dispose => instance.on_dispose().await,
    }
}

impl ComponentRegistry for ComponentManager {
    fn register(
        &mut self,
        descriptor: ComponentDescriptor,
        config: Option<ConfigSection>,
    ) -> RegistrationResult<()> {
        if self.state.is_ready() {
            error!("组合根已启动，拒绝注册组件: {}", descriptor.id);
            return Err(RegistrationError::RegistryLocked { id: descriptor.id });
        }
        self.registry.register(descriptor, config)
    }

    fn lookup(&self, id: &str) -> Option<&ComponentDescriptor> {
        self.registry.lookup(id)
    }
}

/// 查找不受状态限制：钩子失败后状态仍为 `Unconfigured`，但已构造的实例保留，
/// 直到下一次 `setup` 清空。解析失败时实例表为空。
impl ComponentLookup for ComponentManager {
    fn get_instance(&self, id: &str) -> Option<ComponentInstance> {
        self.instances.read().get(id).cloned()
    }
}
