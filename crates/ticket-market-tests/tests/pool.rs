use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eyre::Result;
use ticket_market_core::Ticket;
use ticket_market_engine::{CancelToken, Rejected, TicketPool};
use tokio::task;
use util::{pool, removal_order, tickets};

mod util;

/// Put `ticket`, retrying while the pool is full
fn put_retrying(pool: &TicketPool, ticket: Ticket) -> usize {
    loop {
        match pool.put(ticket.clone()) {
            Ok(len) => return len,
            Err(Rejected(_)) => thread::yield_now(),
        }
    }
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_size_stays_within_capacity() -> Result<()> {
    const CAPACITY: usize = 4;
    let (pool, _) = pool(CAPACITY);
    let done = Arc::new(AtomicBool::new(false));

    let sampler = {
        let pool = pool.clone();
        let done = done.clone();
        task::spawn_blocking(move || {
            let mut samples = 0;
            while !done.load(Ordering::Acquire) {
                assert!(pool.len() <= CAPACITY, "the pool exceeded its capacity");
                samples += 1;
            }
            samples
        })
    };

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let pool = pool.clone();
            task::spawn_blocking(move || {
                for i in 0..200 {
                    let len = put_retrying(&pool, Ticket::new(format!("P{p}-{i}")));
                    assert!((1..=CAPACITY).contains(&len));
                }
            })
        })
        .collect();
    let consumers: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            task::spawn_blocking(move || {
                let token = CancelToken::never();
                for _ in 0..400 {
                    let (_, remaining) = pool.take(&token).unwrap();
                    assert!(remaining < CAPACITY);
                }
            })
        })
        .collect();

    for handle in producers.into_iter().chain(consumers) {
        handle.await?;
    }
    done.store(true, Ordering::Release);
    assert!(sampler.await? > 0);

    assert_eq!(pool.len(), 0, "every accepted ticket must have been taken");
    Ok(())
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn test_fifo_order() -> Result<()> {
    let (pool, log) = pool(8);
    let token = CancelToken::never();
    let all = tickets(8);

    for t in &all[..5] {
        pool.put(t.clone())?;
    }
    assert_eq!(pool.take(&token)?.0, all[0]);
    assert_eq!(pool.take(&token)?.0, all[1]);
    for t in &all[5..] {
        pool.put(t.clone())?;
    }
    for expected in &all[2..] {
        assert_eq!(&pool.take(&token)?.0, expected);
    }
    assert_eq!(removal_order(&log), all);
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_fifo_order_with_concurrent_customers() -> Result<()> {
    const CUSTOMERS: usize = 4;
    const PER_CUSTOMER: usize = 25;
    let (pool, log) = pool(8);
    let all = tickets(CUSTOMERS * PER_CUSTOMER);

    let customers: Vec<_> = (0..CUSTOMERS)
        .map(|_| {
            let pool = pool.clone();
            task::spawn_blocking(move || {
                let token = CancelToken::never();
                (0..PER_CUSTOMER)
                    .map(|_| pool.take(&token).unwrap().0)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let producer = {
        let pool = pool.clone();
        let all = all.clone();
        task::spawn_blocking(move || {
            for t in all {
                put_retrying(&pool, t);
            }
        })
    };
    producer.await?;

    for received in futures::future::try_join_all(customers).await? {
        // ids are zero-padded, so string order is insertion order
        assert!(
            received.windows(2).all(|w| w[0] < w[1]),
            "a customer received tickets out of order: {received:?}"
        );
    }
    assert_eq!(removal_order(&log), all);
    Ok(())
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn test_take_blocks_until_put() -> Result<()> {
    let (pool, _) = pool(2);
    let all = tickets(2);

    let mut taker = {
        let pool = pool.clone();
        task::spawn_blocking(move || pool.take(&CancelToken::never()))
    };
    assert!(
        tokio::time::timeout(Duration::from_millis(100), &mut taker)
            .await
            .is_err(),
        "take must block while the pool is empty"
    );

    pool.put(all[0].clone())?;
    assert_eq!(taker.await??, (all[0].clone(), 0));

    pool.put(all[1].clone())?;
    assert_eq!(pool.take(&CancelToken::never())?, (all[1].clone(), 0));
    Ok(())
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn test_put_rejected_at_capacity() -> Result<()> {
    let (pool, log) = pool(3);
    let all = tickets(3);
    for t in &all {
        pool.put(t.clone())?;
    }

    let extra = Ticket::new("T-extra");
    assert_eq!(pool.put(extra.clone()), Err(Rejected(extra.clone())));
    assert_eq!(pool.len(), 3);
    assert_eq!(log.len(), 3, "a rejected put must not emit events");

    let token = CancelToken::never();
    for expected in &all {
        assert_eq!(&pool.take(&token)?.0, expected);
    }
    assert!(!removal_order(&log).contains(&extra));
    Ok(())
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn test_concurrent_customers_get_distinct_tickets() -> Result<()> {
    const K: usize = 8;
    let (pool, _) = pool(1);
    let all = tickets(K);

    let customers: Vec<_> = (0..K)
        .map(|_| {
            let pool = pool.clone();
            task::spawn_blocking(move || pool.take(&CancelToken::never()).unwrap().0)
        })
        .collect();

    // give the customers time to block
    tokio::time::sleep(Duration::from_millis(50)).await;
    for t in &all {
        put_retrying(&pool, t.clone());
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let received = futures::future::try_join_all(customers).await?;
    let distinct: HashSet<_> = received.iter().cloned().collect();
    assert_eq!(received.len(), K);
    assert_eq!(distinct, all.into_iter().collect::<HashSet<_>>());
    assert!(pool.is_empty());
    Ok(())
}
