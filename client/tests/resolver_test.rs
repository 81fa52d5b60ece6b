use std::sync::Arc;

use ethers_core::types::U256;
use tokio_util::sync::CancellationToken;

use erc721_client::ResolutionError;
use erc721_mock::MockErc721;
use erc721_types::calls;

mod common;

use crate::common::{alice, bob, collection, resolver, token};

#[tokio::test]
async fn test_zero_balance_probes_no_tier() {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), token(0), "0.json");

    let ids = resolver(&mock).resolve(bob()).await.unwrap();

    assert!(ids.is_empty());
    assert_eq!(mock.calls(calls::BALANCE_OF), 1);
    assert_eq!(mock.calls(calls::TOKEN_OF_OWNER_BY_INDEX), 0);
    assert_eq!(mock.calls(calls::TOKENS_OF_OWNER), 0);
    assert_eq!(mock.calls(calls::TOTAL_SUPPLY), 0);
    assert_eq!(mock.calls(calls::OWNER_OF), 0);
}

#[tokio::test]
async fn test_enumerable_tier_serves_alone() -> anyhow::Result<()> {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), token(2), "2.json");
    mock.mint(alice(), token(5), "5.json");
    mock.mint(alice(), token(9), "9.json");
    mock.mint(bob(), token(4), "4.json");

    let ids = resolver(&mock).resolve(alice()).await?;

    assert_eq!(ids, vec![token(2), token(5), token(9)]);
    assert_eq!(mock.calls(calls::TOKEN_OF_OWNER_BY_INDEX), 3);
    assert_eq!(mock.calls(calls::TOKENS_OF_OWNER), 0);
    assert_eq!(mock.calls(calls::TOTAL_SUPPLY), 0);
    assert_eq!(mock.calls(calls::OWNER_OF), 0);
    Ok(())
}

#[tokio::test]
async fn test_bulk_tier_serves_when_enumeration_is_absent() {
    let mock = Arc::new(MockErc721::new().without_enumerable());
    mock.mint(alice(), token(1), "1.json");
    mock.mint(alice(), token(8), "8.json");

    let ids = resolver(&mock).resolve(alice()).await.unwrap();

    assert_eq!(ids, vec![token(1), token(8)]);
    assert_eq!(mock.calls(calls::TOKEN_OF_OWNER_BY_INDEX), 1);
    assert_eq!(mock.calls(calls::TOKENS_OF_OWNER), 1);
    assert_eq!(mock.calls(calls::OWNER_OF), 0);
}

#[tokio::test]
async fn test_failed_enumeration_leaks_no_partial_result() {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), token(0), "0.json");
    mock.mint(alice(), token(4), "4.json");
    mock.mint(alice(), token(6), "6.json");
    mock.fail_nth(calls::TOKEN_OF_OWNER_BY_INDEX, 2);

    let ids = resolver(&mock).resolve(alice()).await.unwrap();

    // The first tier found token 0 before dying; the answer must come
    // from the bulk tier alone, without that fragment merged in.
    assert_eq!(ids, vec![token(0), token(4), token(6)]);
    assert_eq!(mock.calls(calls::TOKEN_OF_OWNER_BY_INDEX), 2);
    assert_eq!(mock.calls(calls::TOKENS_OF_OWNER), 1);
}

#[tokio::test]
async fn test_scan_stops_at_the_completing_index() -> anyhow::Result<()> {
    let mock = Arc::new(MockErc721::new().without_enumerable().without_queryable());
    for n in 0..10u64 {
        let owner = if n == 3 || n == 7 { alice() } else { bob() };
        mock.mint(owner, token(n), &format!("{}.json", n));
    }

    let ids = resolver(&mock).resolve(alice()).await?;

    assert_eq!(ids, vec![token(3), token(7)]);
    // Indices 0 through 7 were probed; 8 and 9 never were.
    assert_eq!(mock.calls(calls::OWNER_OF), 8);
    assert_eq!(mock.calls(calls::TOKEN_OF_OWNER_BY_INDEX), 1);
    assert_eq!(mock.calls(calls::TOKENS_OF_OWNER), 1);
    assert_eq!(mock.calls(calls::TOTAL_SUPPLY), 1);
    Ok(())
}

#[tokio::test]
async fn test_scan_skips_burned_ids() {
    let mock = Arc::new(MockErc721::new().without_enumerable().without_queryable());
    mock.mint(alice(), token(0), "0.json");
    mock.mint(bob(), token(1), "1.json");
    mock.mint(alice(), token(2), "2.json");
    mock.burn(token(1));

    let ids = resolver(&mock).resolve(alice()).await.unwrap();

    assert_eq!(ids, vec![token(0), token(2)]);
}

#[tokio::test]
async fn test_scan_gives_up_on_transport_failures() {
    let mock = Arc::new(MockErc721::new().without_enumerable().without_queryable());
    mock.mint(alice(), token(0), "0.json");
    mock.mint(alice(), token(1), "1.json");
    mock.fail_nth(calls::OWNER_OF, 1);

    let err = resolver(&mock).resolve(alice()).await.unwrap_err();

    assert_eq!(
        err,
        ResolutionError::Unsupported {
            contract: collection()
        }
    );
}

#[tokio::test]
async fn test_concurrent_scan_keeps_ascending_order() {
    let mock = Arc::new(MockErc721::new().without_enumerable().without_queryable());
    for n in 0..12u64 {
        let owner = if n % 3 == 0 { alice() } else { bob() };
        mock.mint(owner, token(n), &format!("{}.json", n));
    }

    let ids = resolver(&mock)
        .with_concurrency(4)
        .resolve(alice())
        .await
        .unwrap();

    assert_eq!(ids, vec![token(0), token(3), token(6), token(9)]);
}

#[tokio::test]
async fn test_resolution_is_idempotent_on_stable_state() {
    let mock = Arc::new(MockErc721::new().without_enumerable().without_queryable());
    mock.mint(alice(), token(0), "0.json");
    mock.mint(bob(), token(1), "1.json");
    mock.mint(alice(), token(2), "2.json");

    let resolver = resolver(&mock);
    let first = resolver.resolve(alice()).await.unwrap();
    let second = resolver.resolve(alice()).await.unwrap();

    assert_eq!(first, vec![token(0), token(2)]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_no_capability_yields_unsupported() {
    let mock = Arc::new(
        MockErc721::new()
            .without_enumerable()
            .without_queryable()
            .without_supply(),
    );
    mock.mint(alice(), token(0), "0.json");

    let err = resolver(&mock).resolve(alice()).await.unwrap_err();

    assert_eq!(
        err,
        ResolutionError::Unsupported {
            contract: collection()
        }
    );
}

#[tokio::test]
async fn test_balance_failure_means_unsupported() {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), token(0), "0.json");
    mock.fail_function(calls::BALANCE_OF);

    let err = resolver(&mock).resolve(alice()).await.unwrap_err();

    assert_eq!(
        err,
        ResolutionError::Unsupported {
            contract: collection()
        }
    );
    assert_eq!(mock.calls(calls::TOKEN_OF_OWNER_BY_INDEX), 0);
}

#[tokio::test]
async fn test_cancellation_before_the_first_probe() {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), token(0), "0.json");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = resolver(&mock)
        .with_cancellation(cancel)
        .resolve(alice())
        .await
        .unwrap_err();

    assert_eq!(err, ResolutionError::Cancelled);
    assert_eq!(mock.calls(calls::BALANCE_OF), 0);
}

#[tokio::test]
async fn test_cancellation_tears_down_a_hung_tier() {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), token(0), "0.json");
    mock.mint(alice(), token(1), "1.json");
    mock.hang_function(calls::TOKEN_OF_OWNER_BY_INDEX);
    let cancel = CancellationToken::new();
    let resolver = resolver(&mock).with_cancellation(cancel.clone());

    let handle = tokio::spawn(async move { resolver.resolve(alice()).await });
    tokio::task::yield_now().await;
    cancel.cancel();

    let err = handle.await.unwrap().unwrap_err();
    assert_eq!(err, ResolutionError::Cancelled);
}

#[tokio::test]
async fn test_full_range_token_ids_survive() {
    let mock = Arc::new(MockErc721::new());
    mock.mint(alice(), U256::MAX, "max.json");

    let ids = resolver(&mock).resolve(alice()).await.unwrap();

    assert_eq!(ids, vec![U256::MAX]);
}
