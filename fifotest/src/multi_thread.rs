#[cfg(test)]
mod tests {
    use lffifo::FifoBuffer;
    use std::thread::spawn;
    use std::time::{Duration, Instant};

    #[cfg(feature = "travisci")]
    const ITERS: usize = 100_000;
    #[cfg(not(feature = "travisci"))]
    const ITERS: usize = 1_000_000;

    static BUF: FifoBuffer<256> = FifoBuffer::new();

    #[test]
    fn sanity_check() {
        let (mut tx, mut rx) = BUF.try_split().unwrap();

        let timeout_tx = Duration::from_millis(10000);
        let timeout_rx = Duration::from_millis(10100);
        let start_tx = Instant::now();
        let start_rx = start_tx.clone();

        let tx_thr = spawn(move || {
            for i in 0..ITERS {
                'inner: loop {
                    if start_tx.elapsed() > timeout_tx {
                        panic!("tx timeout, iter {}", i);
                    }
                    match tx.write((i & 0xFF) as u8) {
                        Ok(()) => {
                            #[cfg(feature = "verbose")]
                            println!("TX {}", i);
                            break 'inner;
                        }
                        Err(_) => {}
                    }
                }
            }
        });

        let rx_thr = spawn(move || {
            for i in 0..ITERS {
                'inner: loop {
                    if start_rx.elapsed() > timeout_rx {
                        panic!("rx timeout, iter {}", i);
                    }
                    match rx.read() {
                        Ok(byte) => {
                            assert_eq!(byte, (i & 0xFF) as u8, "RX Iter: {}", i);
                            break 'inner;
                        }
                        Err(_) => continue 'inner,
                    }
                }
            }
        });

        tx_thr.join().unwrap();
        rx_thr.join().unwrap();
    }
}
