//! Model-based checks for the duplex pipe's byte accounting.

use proptest::prelude::*;
use streamprims_channel::{pipe, Channel, ChannelError};

#[derive(Debug, Clone)]
enum Op {
    Write(Vec<u8>),
    Read(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        prop::collection::vec(any::<u8>(), 0..48).prop_map(Op::Write),
        (0usize..48).prop_map(Op::Read),
    ];
    prop::collection::vec(op, 0..64)
}

proptest! {
    #[test]
    fn prop_capacity_is_conserved(capacity in 1usize..64, ops in ops()) {
        let (mut a, mut b) = pipe(capacity).unwrap();

        for op in ops {
            match op {
                Op::Write(data) => {
                    let _ = a.write(&data);
                }
                Op::Read(len) => {
                    let mut out = vec![0u8; len];
                    let _ = b.read(&mut out);
                }
            }
            prop_assert_eq!(a.in_flight() + a.query_write_capacity(), capacity);
            prop_assert_eq!(a.query_write_capacity(), a.query_write_capacity());
        }

        a.shutdown_write().unwrap();
        prop_assert_eq!(a.in_flight() + a.query_write_capacity(), capacity);
        let mut out = vec![0u8; capacity];
        let _ = b.read(&mut out);
        prop_assert_eq!(a.query_write_capacity(), capacity);
    }

    #[test]
    fn prop_partial_writes_accept_exactly_free_space(capacity in 1usize..64, ops in ops()) {
        let (mut a, mut b) = pipe(capacity).unwrap();

        for op in ops {
            match op {
                Op::Write(data) => {
                    let free = a.query_write_capacity();
                    match a.write(&data) {
                        Ok(n) => prop_assert_eq!(n, data.len().min(free)),
                        Err(ChannelError::WouldBlock) => {
                            prop_assert_eq!(free, 0);
                            prop_assert!(!data.is_empty());
                        }
                        Err(err) => prop_assert!(false, "unexpected write error: {}", err),
                    }
                }
                Op::Read(len) => {
                    let available = b.buffered();
                    let mut out = vec![0u8; len];
                    match b.read(&mut out) {
                        Ok(n) => prop_assert_eq!(n, len.min(available)),
                        Err(ChannelError::WouldBlock) => prop_assert_eq!(available, 0),
                        Err(err) => prop_assert!(false, "unexpected read error: {}", err),
                    }
                }
            }
        }
    }

    #[test]
    fn prop_bytes_arrive_in_write_order(
        capacity in 1usize..32,
        data in prop::collection::vec(any::<u8>(), 0..512),
        write_chunk in 1usize..40,
        read_chunk in 1usize..40,
    ) {
        let (mut a, mut b) = pipe(capacity).unwrap();
        let mut sent = 0usize;
        let mut received = Vec::with_capacity(data.len());
        let mut out = vec![0u8; read_chunk];

        while received.len() < data.len() {
            if sent < data.len() {
                let end = (sent + write_chunk).min(data.len());
                match a.write(&data[sent..end]) {
                    Ok(n) => sent += n,
                    Err(err) => prop_assert!(err.is_would_block()),
                }
            }
            match b.read(&mut out) {
                Ok(n) => {
                    prop_assert!(n > 0);
                    received.extend_from_slice(&out[..n]);
                }
                Err(err) => prop_assert!(err.is_would_block()),
            }
        }

        a.shutdown_write().unwrap();
        prop_assert_eq!(b.read(&mut out).unwrap(), 0);
        prop_assert_eq!(received, data);
    }

    #[test]
    fn prop_shutdown_is_terminal(
        before in prop::collection::vec(any::<u8>(), 0..32),
        after in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let (mut a, mut b) = pipe(64).unwrap();
        let written = a.write(&before).unwrap_or(0);
        a.shutdown_write().unwrap();

        prop_assert!(a.write(&after).unwrap_err().is_broken_pipe());

        let mut drained = vec![0u8; 64];
        let mut total = 0;
        loop {
            let n = b.read(&mut drained[total..]).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        prop_assert_eq!(total, written);
        prop_assert_eq!(&drained[..total], &before[..]);
    }
}
