//! Integration tests exercising the node around a live chain:
//! config file → node wiring → block import → background promotion →
//! metrics → shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use xdag_consensus::{ChainCollaborators, ImportResult};
use xdag_node::{NodeConfig, NodeError, NodeStores, XdagNode};
use xdag_nullables::{
    NullAddressStore, NullBlockStore, NullClock, NullOrphanStore, NullPow, NullTxHistory,
    NullVerifier,
};
use xdag_types::{Address, Block, BlockHash, ChainParams, Clock, HashLow, SystemClock, XdagTime};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const NOW_ROUND: u64 = 3_000;

fn hash(id: u32) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[8..12].copy_from_slice(&id.to_le_bytes());
    bytes[24..32].copy_from_slice(&(1u64 << 40).to_le_bytes());
    BlockHash::new(bytes)
}

fn hl(id: u32) -> HashLow {
    hash(id).hash_low()
}

fn block(id: u32, round: u64, links: Vec<Address>) -> Block {
    let ts = XdagTime::new(XdagTime::start_of_round(round).ticks() + 1);
    Block::new(ChainParams::devnet().network.block_type_tag(), hash(id), ts, links)
}

fn collaborators(clock: Arc<NullClock>) -> ChainCollaborators {
    ChainCollaborators {
        store: Arc::new(NullBlockStore::new()),
        addresses: Arc::new(NullAddressStore::new()),
        orphans: Arc::new(NullOrphanStore::new()),
        history: Arc::new(NullTxHistory::new()),
        pow: Arc::new(NullPow::new()),
        verifier: Arc::new(NullVerifier::new()),
        clock,
    }
}

fn test_config(dir: &tempfile::TempDir) -> NodeConfig {
    NodeConfig {
        data_dir: dir.path().join("chain"),
        promotion_period_ms: 5,
        shutdown_timeout_ms: 2_000,
        enable_metrics: true,
        ..NodeConfig::default()
    }
}

/// Node over a four-block path 1 <- 2 <- 3 <- 4.
fn node_with_path(dir: &tempfile::TempDir) -> (XdagNode, Arc<NullClock>) {
    let clock = Arc::new(NullClock::new(XdagTime::start_of_round(NOW_ROUND)));
    let node = XdagNode::new(test_config(dir), collaborators(clock.clone()), Vec::new())
        .expect("node should open");

    let base = NOW_ROUND - 10;
    assert_eq!(node.import_block(block(1, base, vec![])), ImportResult::ImportedCanonical);
    for id in 2..=4u32 {
        let links = vec![Address::reference(hl(id - 1))];
        let result = node.import_block(block(id, base + id as u64, links));
        assert_eq!(result, ImportResult::ImportedCanonical);
    }
    (node, clock)
}

async fn wait_for_nmain(node: &XdagNode, target: u64) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if node.chain.stats().nmain >= target {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn background_task_promotes_buried_blocks() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut node, clock) = node_with_path(&dir);
    assert!(dir.path().join("chain").is_dir());

    node.start().await.expect("start");
    assert!(node.is_running());

    // Nothing is old enough yet.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(node.chain.stats().nmain, 0);

    clock.advance_rounds(100);
    assert!(wait_for_nmain(&node, 3).await, "promotion did not reach height 3");
    assert_eq!(node.chain.get_block_by_height(3).unwrap().unwrap().hashlow(), hl(3));

    node.stop().await.expect("clean stop");
    assert!(!node.is_running());

    let metrics = node.metrics.as_ref().expect("metrics enabled");
    assert_eq!(metrics.main_set.get(), 3);
    assert_eq!(metrics.nmain.get(), 3);
    assert_eq!(metrics.nblocks.get(), 4);
    assert!(metrics.scheduler_ticks.get() > 0);
    assert_eq!(metrics.scheduler_tick_errors.get(), 0);
    assert_eq!(
        metrics.imports.with_label_values(&["imported_canonical"]).get(),
        4
    );
}

#[tokio::test]
async fn stopped_node_does_not_promote() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut node, clock) = node_with_path(&dir);
    node.start().await.expect("start");
    node.stop().await.expect("clean stop");

    clock.advance_rounds(100);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(node.chain.stats().nmain, 0);
}

#[tokio::test]
async fn node_can_restart_after_stop() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut node, clock) = node_with_path(&dir);
    node.start().await.expect("start");
    node.stop().await.expect("clean stop");

    clock.advance_rounds(100);
    node.start().await.expect("restart");
    assert!(wait_for_nmain(&node, 1).await);
    node.stop().await.expect("clean stop");
}

#[tokio::test]
async fn second_start_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut node, _clock) = node_with_path(&dir);
    node.start().await.expect("start");
    assert!(matches!(node.start().await, Err(NodeError::AlreadyStarted)));
    node.stop().await.expect("clean stop");
}

#[tokio::test]
async fn stop_without_start_is_clean() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut node, _clock) = node_with_path(&dir);
    node.stop().await.expect("nothing to wait for");
}

// ---------------------------------------------------------------------------
// Import accounting
// ---------------------------------------------------------------------------

#[test]
fn rejected_imports_are_counted_by_result() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _clock) = node_with_path(&dir);

    assert_eq!(node.import_block(block(1, NOW_ROUND - 10, vec![])), ImportResult::AlreadyExists);
    let orphan = block(9, NOW_ROUND - 1, vec![Address::reference(hl(77))]);
    assert_eq!(node.import_block(orphan), ImportResult::MissingParent(hl(77)));

    let metrics = node.metrics.as_ref().unwrap();
    assert_eq!(metrics.imports.with_label_values(&["already_exists"]).get(), 1);
    assert_eq!(metrics.imports.with_label_values(&["missing_parent"]).get(), 1);
    assert!(metrics.encode().unwrap().contains("missing_parent"));
}

#[test]
fn metrics_are_optional() {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = Arc::new(NullClock::new(XdagTime::start_of_round(NOW_ROUND)));
    let config = NodeConfig {
        enable_metrics: false,
        ..test_config(&dir)
    };
    let node = XdagNode::new(config, collaborators(clock), Vec::new()).unwrap();
    assert!(node.metrics.is_none());
    assert!(node.import_block(block(1, NOW_ROUND - 1, vec![])).is_imported());
}

#[test]
fn node_opened_over_stores_admits_current_blocks() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stores = NodeStores {
        blocks: Arc::new(NullBlockStore::new()),
        addresses: Arc::new(NullAddressStore::new()),
        orphans: Arc::new(NullOrphanStore::new()),
        history: Arc::new(NullTxHistory::new()),
    };
    let node = XdagNode::open(test_config(&dir), stores, Vec::new()).expect("node should open");

    let round = SystemClock.now().round().saturating_sub(1);
    assert_eq!(node.import_block(block(1, round, vec![])), ImportResult::ImportedCanonical);
    let future = block(2, round + 1_000, vec![]);
    assert_eq!(node.import_block(future), ImportResult::TimestampOutOfRange);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn config_file_drives_chain_parameters() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("xdag.toml");
    let data_dir = dir.path().join("data");
    std::fs::write(
        &path,
        format!(
            r#"
            network = "Dev"
            data_dir = {data_dir:?}
            log_format = "json"
            promotion_period_ms = 50

            [chain]
            max_allowed_extra = 2
            "#
        ),
    )
    .unwrap();

    let config = NodeConfig::from_toml_file(&path).expect("config should load");
    assert_eq!(config.log_format, "json");

    let clock = Arc::new(NullClock::new(XdagTime::start_of_round(NOW_ROUND)));
    let node = XdagNode::new(config, collaborators(clock), Vec::new()).unwrap();
    assert_eq!(node.chain.params().max_allowed_extra, 2);
    assert!(data_dir.is_dir());

    let written = node.config.to_toml_string().unwrap();
    let reparsed = NodeConfig::from_toml_str(&written).unwrap();
    assert_eq!(reparsed.chain.max_allowed_extra, Some(2));
    assert_eq!(reparsed.data_dir, data_dir);
}

#[test]
fn malformed_config_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "promotion_period_ms = \"soon\"").unwrap();
    assert!(matches!(NodeConfig::from_toml_file(&path), Err(NodeError::Config(_))));
}
