#[cfg(test)]
mod tests {
    use lffifo::{Error, FifoBuffer};
    use rand::Rng;
    use std::collections::VecDeque;

    const ITERS: usize = 100_000;

    // Drive the fifo with random write/read bursts and check every step
    // against a VecDeque model of the same capacity.
    #[test]
    fn random_bursts_match_model() {
        let fifo: FifoBuffer<64> = FifoBuffer::new();
        let (mut prod, mut cons) = fifo.try_split().unwrap();

        let mut model: VecDeque<u8> = VecDeque::new();
        let mut rng = rand::thread_rng();

        for _i in 0..ITERS {
            #[cfg(feature = "extra-verbose")]
            println!("STEP {}: pending {}", _i, model.len());

            if rng.gen_bool(0.5) {
                let byte: u8 = rng.gen();
                match prod.write(byte) {
                    Ok(()) => model.push_back(byte),
                    Err(Error::Full) => assert_eq!(model.len(), 63),
                    Err(e) => panic!("unexpected write error: {:?}", e),
                }
            } else {
                match cons.read() {
                    Ok(byte) => assert_eq!(model.pop_front(), Some(byte)),
                    Err(Error::Empty) => assert!(model.is_empty()),
                    Err(e) => panic!("unexpected read error: {:?}", e),
                }
            }

            assert_eq!(prod.len(), model.len());
            assert_eq!(cons.is_empty(), model.is_empty());
        }

        // Drain whatever the random walk left behind
        while let Ok(byte) = cons.read() {
            assert_eq!(model.pop_front(), Some(byte));
        }
        assert!(model.is_empty());
    }

    // Same walk, but with an occasional flush thrown in.
    #[test]
    fn random_bursts_with_flush() {
        let fifo: FifoBuffer<64> = FifoBuffer::new();
        let (mut prod, mut cons) = fifo.try_split().unwrap();

        let mut model: VecDeque<u8> = VecDeque::new();
        let mut rng = rand::thread_rng();

        for _ in 0..ITERS {
            match rng.gen_range(0..10) {
                0 => {
                    cons.flush();
                    model.clear();
                    assert!(cons.is_empty());
                }
                1..=5 => {
                    let byte: u8 = rng.gen();
                    match prod.write(byte) {
                        Ok(()) => model.push_back(byte),
                        Err(Error::Full) => assert_eq!(model.len(), 63),
                        Err(e) => panic!("unexpected write error: {:?}", e),
                    }
                }
                _ => match cons.read() {
                    Ok(byte) => assert_eq!(model.pop_front(), Some(byte)),
                    Err(Error::Empty) => assert!(model.is_empty()),
                    Err(e) => panic!("unexpected read error: {:?}", e),
                },
            }

            assert_eq!(cons.len(), model.len());
        }
    }
}
