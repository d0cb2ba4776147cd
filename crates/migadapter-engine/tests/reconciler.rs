//! Reconciler behavior against an in-memory cluster.

use std::sync::Arc;

use migadapter_core::{
    CONDITION_SCHEDULED, Condition, ConditionStatus, Container, ContainerResources, Host,
    ObjectMeta, PROFILE_LABEL_KEY, Phase, Quantity, REASON_UNSCHEDULABLE, ResourceList,
    ResourceRequirements, Workload, WorkloadKey,
};
use migadapter_engine::{
    Adapter, ClusterSnapshot, ClusterState, MemoryCluster, ReconcileOutcome, Reconciler,
};

const MIG_1G: &str = "nvidia.com/mig-1g.5gb";
const MIG_2G: &str = "nvidia.com/mig-2g.10gb";
const MIG_3G: &str = "nvidia.com/mig-3g.20gb";
const MIG_4G: &str = "nvidia.com/mig-4g.20gb";

fn gpu(partition: &str) -> ResourceRequirements {
    let list: ResourceList = [(partition.to_string(), Quantity::from_units(1))].into();
    ResourceRequirements {
        requests: list.clone(),
        limits: list,
        claims: Vec::new(),
    }
}

fn host(name: &str, alloc: &[(&str, i64)]) -> Host {
    Host {
        meta: ObjectMeta {
            name: name.to_string(),
            ..Default::default()
        },
        allocatable: alloc
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity::from_units(*v)))
            .collect(),
    }
}

fn running(name: &str, host: &str, partition: &str) -> Workload {
    let mut w = Workload::default();
    w.meta.namespace = "test".to_string();
    w.meta.name = name.to_string();
    w.spec.host_name = Some(host.to_string());
    w.status.phase = Phase::Running;
    w.spec.containers.push(Container {
        name: "c1".to_string(),
        resources: gpu(partition),
    });
    w
}

fn pending(name: &str, partition: &str) -> Workload {
    let mut w = Workload::default();
    w.meta.namespace = "test".to_string();
    w.meta.name = name.to_string();
    w.status.phase = Phase::Pending;
    w.status.conditions.push(Condition {
        kind: CONDITION_SCHEDULED.to_string(),
        status: ConditionStatus::False,
        reason: REASON_UNSCHEDULABLE.to_string(),
        message: format!("0/2 nodes are available, Insufficient {partition},"),
    });
    w.spec.containers.push(Container {
        name: "c1".to_string(),
        resources: gpu(partition),
    });
    w
}

fn annotated(adapter: &Adapter, mut w: Workload, original: &str) -> Workload {
    let mut records = ContainerResources::new();
    records.insert("c1".to_string(), gpu(original));
    w.meta.annotations.insert(
        adapter.annotation_key().to_string(),
        serde_json::to_string(&records).unwrap(),
    );
    w
}

fn reconciler(hosts: Vec<Host>, workloads: Vec<Workload>) -> Reconciler<MemoryCluster> {
    let cluster = Arc::new(MemoryCluster::new(ClusterSnapshot { hosts, workloads }));
    Reconciler::new(Adapter::new(), cluster)
}

#[tokio::test]
async fn pending_workload_is_resized_and_restarted() {
    let r = reconciler(vec![host("node1", &[(MIG_2G, 1)])], vec![pending("podpending", MIG_1G)]);
    let key = WorkloadKey::new("test", "podpending");

    let outcome = r.reconcile(&key).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Resized { workload: key.clone() });

    assert!(r.cluster().get_workload(&key).await.unwrap().is_none());
    let rule = r.adapter().rules().get(&key, "c1");
    assert_eq!(rule.requests, Some(gpu(MIG_2G).requests));
}

#[tokio::test]
async fn idle_host_is_labeled_when_nothing_fits() {
    let r = reconciler(
        vec![
            host("node1", &[(MIG_2G, 1), (MIG_3G, 1)]),
            host("node2", &[(MIG_1G, 2), (MIG_2G, 1), (MIG_3G, 1)]),
        ],
        vec![
            running("pod1", "node1", MIG_2G),
            running("pod2", "node1", MIG_3G),
            pending("podpending", MIG_4G),
        ],
    );

    let outcome = r
        .reconcile(&WorkloadKey::new("test", "podpending"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::HostLabeled {
            host: "node2".to_string(),
            profile: "all-4g.20gb".to_string(),
        }
    );

    let hosts = r.cluster().list_hosts().await.unwrap();
    assert_eq!(
        hosts[1].meta.labels.get(PROFILE_LABEL_KEY).map(String::as_str),
        Some("all-4g.20gb")
    );
    assert!(hosts[0].meta.labels.is_empty());
    // The pending workload stays put; it schedules once the host is repartitioned.
    assert_eq!(r.cluster().list_workloads().await.unwrap().len(), 3);
}

#[tokio::test]
async fn running_workload_needs_no_action() {
    let r = reconciler(vec![host("node1", &[(MIG_1G, 1)])], vec![running("pod1", "node1", MIG_1G)]);
    let outcome = r.reconcile(&WorkloadKey::new("test", "pod1")).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::NoAction);
}

#[tokio::test]
async fn deletion_restarts_workloads_that_can_shrink() {
    let adapter = Adapter::new();
    let resized = annotated(&adapter, running("job-abcde", "node1", MIG_2G), MIG_1G);
    let cluster = Arc::new(MemoryCluster::new(ClusterSnapshot {
        hosts: vec![host("node1", &[(MIG_1G, 1), (MIG_2G, 1)])],
        workloads: vec![resized],
    }));
    let r = Reconciler::new(adapter, cluster);

    let outcome = r.reconcile(&WorkloadKey::new("test", "blocker")).await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Restored {
            restarted: vec![WorkloadKey::new("test", "job-abcde")],
        }
    );
    assert!(r.cluster().list_workloads().await.unwrap().is_empty());
}

#[tokio::test]
async fn deletion_clears_stale_rules_for_concrete_name() {
    let r = reconciler(vec![host("node1", &[(MIG_1G, 1)])], Vec::new());
    let gone = WorkloadKey::new("test", "pod1");
    let generated = WorkloadKey::new("test", "job-");
    r.adapter()
        .rules()
        .store(&gone, "c1", Some(gpu(MIG_2G).requests), None, None);
    r.adapter()
        .rules()
        .store(&generated, "c1", Some(gpu(MIG_2G).requests), None, None);

    assert_eq!(r.reconcile(&gone).await.unwrap(), ReconcileOutcome::NoAction);
    assert!(!r.adapter().rules().contains(&gone));
    assert!(r.adapter().rules().contains(&generated));
}

#[tokio::test]
async fn reconcile_all_notices_vanished_workloads() {
    let adapter = Adapter::new();
    let resized = annotated(&adapter, running("job-abcde", "node1", MIG_2G), MIG_1G);
    let blocker = running("blocker", "node1", MIG_1G);
    let cluster = Arc::new(MemoryCluster::new(ClusterSnapshot {
        hosts: vec![host("node1", &[(MIG_1G, 1), (MIG_2G, 1)])],
        workloads: vec![blocker.clone(), resized],
    }));
    let r = Reconciler::new(adapter, Arc::clone(&cluster));

    // Everything is running and the 1g slot is taken.
    assert!(r.reconcile_all().await.unwrap().is_empty());

    cluster.delete_workload(&blocker).await.unwrap();
    let report = r.reconcile_all().await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].workload, WorkloadKey::new("test", "blocker"));
    assert!(matches!(report[0].outcome, ReconcileOutcome::Restored { .. }));
}

#[tokio::test]
async fn recreated_workload_is_mutated_at_admission() {
    let mut submitted = pending("", MIG_1G);
    submitted.meta.generate_name = "job-".to_string();
    submitted.meta.name = "job-aaaaa".to_string();

    let r = reconciler(vec![host("node1", &[(MIG_3G, 1)])], vec![submitted.clone()]);
    let outcome = r.reconcile(&submitted.reference()).await.unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Resized { .. }));

    // The controller submits a fresh instance under the same prefix.
    let mut fresh = submitted.clone();
    fresh.meta.name = String::new();
    fresh.status = Default::default();
    assert!(r.adapter().mutate(&mut fresh));
    assert_eq!(fresh.spec.containers[0].resources, gpu(MIG_3G));
    assert!(fresh.annotation(r.adapter().annotation_key()).is_some());

    r.cluster().create_workload(fresh).await;
    assert_eq!(r.cluster().list_workloads().await.unwrap().len(), 1);
}
