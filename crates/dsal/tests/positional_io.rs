//! End-to-end exercises of the positional IO façade against the in-memory
//! reference backend, covering the invariants and concrete scenarios the
//! façade is expected to uphold. Grounded on `osdclient/tests/integration_test.rs`'s
//! shape (a setup helper builds a client, each test exercises it directly),
//! simplified here since `dsal-memstore` needs no external cluster.

use std::sync::Arc;

use dsal::facade::{pread, pwrite, resize};
use dsal::{BackendRegistry, DataStore, ObjectHandle};
use dsal_config::Config;
use dsal_memstore::MemBackend;

const BS: u32 = 4096;

async fn setup() -> (Arc<DataStore>, ObjectHandle) {
    let mut registry = BackendRegistry::new();
    registry.register("memory", || Arc::new(MemBackend::new()));

    let cfg = Config::parse(&format!("[dstore]\ntype = memory\nbsize = {BS}\n"));
    let store = DataStore::init(&registry, &cfg, 0).await.unwrap();

    let oid = store.obj_get_new_id().await.unwrap();
    store.obj_create(None, oid).await.unwrap();
    let handle = store.obj_open(oid).await.unwrap();

    (store, handle)
}

#[tokio::test]
async fn invariant_write_then_read_round_trips() {
    let (_store, handle) = setup().await;
    let written = vec![b'X'; 5000];
    pwrite(&handle, 1000, &written, BS).await.unwrap();

    let mut read_back = vec![0u8; 5000];
    pread(&handle, 1000, &mut read_back, BS).await.unwrap();
    assert_eq!(written, read_back);

    handle.close().await.unwrap();
}

#[tokio::test]
async fn invariant_unwritten_range_reads_as_zero() {
    let (_store, handle) = setup().await;
    let mut buf = vec![0xffu8; BS as usize];
    pread(&handle, 0, &mut buf, BS).await.unwrap();
    assert!(buf.iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}

#[tokio::test]
async fn invariant_shrink_then_grow_reads_as_zero() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 0, &vec![b'B'; 2 * BS as usize], BS).await.unwrap();
    resize(&handle, 2 * BS as u64, BS as u64, BS).await.unwrap();

    let mut buf = vec![0u8; BS as usize];
    pread(&handle, BS as u64, &mut buf, BS).await.unwrap();
    assert!(buf.iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}

#[tokio::test]
async fn invariant_growing_resize_preserves_existing_range() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 0, &vec![b'A'; BS as usize], BS).await.unwrap();
    resize(&handle, BS as u64, 2 * BS as u64, BS).await.unwrap();

    let mut buf = vec![0u8; BS as usize];
    pread(&handle, 0, &mut buf, BS).await.unwrap();
    assert!(buf.iter().all(|&b| b == b'A'));
    handle.close().await.unwrap();
}

#[tokio::test]
async fn invariant_write_does_not_disturb_adjacent_bytes() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 0, &vec![b'A'; BS as usize], BS).await.unwrap();
    pwrite(&handle, BS as u64, &vec![b'B'; BS as usize], BS).await.unwrap();

    let mut buf = vec![0u8; 2 * BS as usize];
    pread(&handle, 0, &mut buf, BS).await.unwrap();
    assert!(buf[0..BS as usize].iter().all(|&b| b == b'A'));
    assert!(buf[BS as usize..].iter().all(|&b| b == b'B'));
    handle.close().await.unwrap();
}

#[tokio::test]
async fn invariant_hole_read_mixes_written_and_zero_blocks() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 2 * BS as u64, &vec![b'E'; BS as usize], BS).await.unwrap();

    let mut buf = vec![0u8; 3 * BS as usize];
    pread(&handle, 0, &mut buf, BS).await.unwrap();
    assert!(buf[0..2 * BS as usize].iter().all(|&b| b == 0));
    assert!(buf[2 * BS as usize..].iter().all(|&b| b == b'E'));
    handle.close().await.unwrap();
}

#[tokio::test]
async fn invariant_close_after_every_op_waits_is_clean() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 0, &vec![1u8; BS as usize], BS).await.unwrap();
    assert!(handle.close().await.is_ok());
}

/// S1 - inside-block write then full-block read.
#[tokio::test]
async fn s1_inside_block_write_then_full_block_read() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 3000, &vec![b'A'; 100], BS).await.unwrap();

    let mut buf = vec![0u8; 4096];
    pread(&handle, 0, &mut buf, BS).await.unwrap();

    assert!(buf[0..3000].iter().all(|&b| b == 0));
    assert!(buf[3000..3100].iter().all(|&b| b == b'A'));
    assert!(buf[3100..4096].iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}

/// S2 - cross-block non-right-aligned write, layered on S1.
#[tokio::test]
async fn s2_cross_block_non_right_aligned_write() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 3000, &vec![b'A'; 100], BS).await.unwrap();
    pwrite(&handle, 3100, &vec![b'B'; 2000], BS).await.unwrap();

    let mut buf = vec![0u8; 8192];
    pread(&handle, 0, &mut buf, BS).await.unwrap();

    assert!(buf[0..3000].iter().all(|&b| b == 0));
    assert!(buf[3000..3100].iter().all(|&b| b == b'A'));
    assert!(buf[3100..5100].iter().all(|&b| b == b'B'));
    assert!(buf[5100..8192].iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}

/// S3 - non-left, right-aligned write, layered on S2.
#[tokio::test]
async fn s3_non_left_right_aligned_write() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 3000, &vec![b'A'; 100], BS).await.unwrap();
    pwrite(&handle, 3100, &vec![b'B'; 2000], BS).await.unwrap();
    pwrite(&handle, 5100, &vec![b'C'; 7188], BS).await.unwrap();

    let mut buf = vec![0u8; 8192];
    pread(&handle, 4096, &mut buf, BS).await.unwrap();

    assert!(buf[0..1004].iter().all(|&b| b == b'B'));
    assert!(buf[1004..1004 + 7188].iter().all(|&b| b == b'C'));
    handle.close().await.unwrap();
}

/// S4 - left-aligned, non-right-aligned write spanning many blocks.
#[tokio::test]
async fn s4_left_aligned_non_right_aligned_write_spanning_blocks() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 3000, &vec![b'A'; 100], BS).await.unwrap();
    pwrite(&handle, 3100, &vec![b'B'; 2000], BS).await.unwrap();
    pwrite(&handle, 5100, &vec![b'C'; 7188], BS).await.unwrap();
    pwrite(&handle, 12288, &vec![b'D'; 17000], BS).await.unwrap();

    let mut buf = vec![0u8; 20480];
    pread(&handle, 12288, &mut buf, BS).await.unwrap();

    assert!(buf[0..17000].iter().all(|&b| b == b'D'));
    assert!(buf[17000..20480].iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}

/// S5 - sparse hole read.
#[tokio::test]
async fn s5_sparse_hole_read() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 40960, &vec![b'E'; 4096], BS).await.unwrap();

    let mut buf = vec![0u8; 12288];
    pread(&handle, 32768, &mut buf, BS).await.unwrap();

    assert!(buf[0..8192].iter().all(|&b| b == 0));
    assert!(buf[8192..12288].iter().all(|&b| b == b'E'));
    handle.close().await.unwrap();
}

/// S6 - shrink then read across the new boundary.
#[tokio::test]
async fn s6_shrink_then_read_across_boundary() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 0, &vec![b'B'; 8192], BS).await.unwrap();
    resize(&handle, 8192, 4096, BS).await.unwrap();

    let mut buf = vec![0u8; 8192];
    pread(&handle, 0, &mut buf, BS).await.unwrap();

    assert!(buf[0..4096].iter().all(|&b| b == b'B'));
    assert!(buf[4096..8192].iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}

/// S7 - shrink to a non-block-aligned old size down to zero.
#[tokio::test]
async fn s7_shrink_non_block_aligned_old_size() {
    let (_store, handle) = setup().await;
    pwrite(&handle, 0, &vec![b'A'; 3000], BS).await.unwrap();
    resize(&handle, 3000, 0, BS).await.unwrap();

    let mut buf = vec![0u8; 4096];
    pread(&handle, 0, &mut buf, BS).await.unwrap();

    assert!(buf.iter().all(|&b| b == 0));
    handle.close().await.unwrap();
}
