use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crossbeam_utils::thread;
use lffifo::FifoBuffer;

const DATA_SZ: usize = 1024 * 1024;

pub fn criterion_benchmark(c: &mut Criterion) {
    let data = (0..DATA_SZ)
        .map(|i| (i & 0xFF) as u8)
        .collect::<Vec<u8>>()
        .into_boxed_slice();

    let buffy: FifoBuffer<256> = FifoBuffer::new();
    let (mut prod, mut cons) = buffy.try_split().unwrap();

    c.bench_function("lffifo 255/256 same thread", |bench| {
        bench.iter(|| {
            data.chunks(255).for_each(|ch| {
                for by in ch {
                    prod.write(black_box(*by)).unwrap();
                }
                for by in ch {
                    assert_eq!(cons.read(), Ok(*by));
                }
            });
        })
    });

    c.bench_function("lffifo 256 two threads", |bench| {
        bench.iter(|| {
            thread::scope(|sc| {
                sc.spawn(|_| {
                    for by in data.iter() {
                        while prod.write(black_box(*by)).is_err() {}
                    }
                });

                sc.spawn(|_| {
                    for by in data.iter() {
                        loop {
                            if let Ok(got) = cons.read() {
                                assert_eq!(got, *by);
                                break;
                            }
                        }
                    }
                });
            })
            .unwrap();
        })
    });

    use heapless::spsc::Queue;
    let mut queue: Queue<u8, 256> = Queue::new();
    let (mut h_prod, mut h_cons) = queue.split();

    c.bench_function("heapless spsc::Queue 255/256 same thread", |bench| {
        bench.iter(|| {
            data.chunks(255).for_each(|ch| {
                for by in ch {
                    h_prod.enqueue(black_box(*by)).unwrap();
                }
                for by in ch {
                    assert_eq!(h_cons.dequeue(), Some(*by));
                }
            });
        })
    });

    c.bench_function("xbeam channel 256 two threads", |bench| {
        bench.iter(|| {
            use crossbeam::channel::bounded;
            let (tx, rx) = bounded::<u8>(256);
            let rdata = &data;

            thread::scope(|sc| {
                sc.spawn(move |_| {
                    for by in rdata.iter() {
                        tx.send(*by).unwrap();
                    }
                });

                sc.spawn(move |_| {
                    for by in rdata.iter() {
                        assert_eq!(rx.recv(), Ok(*by));
                    }
                });
            })
            .unwrap();
        })
    });

    cfg_if::cfg_if! {
        if #[cfg(feature = "nightly")] {
            c.bench_function("bounded queue 256 two threads", |bench| {
                bench.iter(|| {
                    use bounded_spsc_queue::make;
                    let (b_prod, b_cons) = make::<u8>(256);
                    let rdata = &data;

                    thread::scope(|sc| {
                        sc.spawn(move |_| {
                            for by in rdata.iter() {
                                b_prod.push(*by);
                            }
                        });

                        sc.spawn(move |_| {
                            for by in rdata.iter() {
                                assert_eq!(b_cons.pop(), *by);
                            }
                        });
                    })
                    .unwrap();
                })
            });
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
