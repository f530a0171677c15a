use nexusdriver::{Completion, DriverError};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

proptest! {
    #[test]
    fn prop_first_writer_wins_across_threads(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        let completion: Completion<i32> = Completion::new();
        let handles: Vec<_> = values
            .iter()
            .map(|&v| {
                let c = completion.clone();
                thread::spawn(move || (v, c.succeed(v)))
            })
            .collect();
        let results: Vec<(i32, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<i32> = results.iter().filter(|(_, won)| *won).map(|(v, _)| *v).collect();
        prop_assert_eq!(winners.len(), 1);
        prop_assert_eq!(completion.outcome(), Some(Ok(winners[0])));
        prop_assert!(!completion.fail(DriverError::Operation("late".into())));
    }

    #[test]
    fn prop_continuations_run_once_in_registration_order(before in 0usize..10, after in 0usize..10) {
        let completion: Completion<u8> = Completion::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..before {
            let log = Arc::clone(&log);
            completion.register(move |outcome| log.lock().push((i, outcome)));
        }
        completion.succeed(9);
        completion.succeed(1);
        for i in before..before + after {
            let log = Arc::clone(&log);
            completion.register(move |outcome| log.lock().push((i, outcome)));
        }
        let expected: Vec<(usize, Result<u8, DriverError>)> = (0..before + after).map(|i| (i, Ok(9))).collect();
        prop_assert_eq!(log.lock().clone(), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_concurrent_registration_runs_exactly_once(registrants in 1usize..6, rounds in 1usize..20) {
        for _ in 0..rounds {
            let completion: Completion<u32> = Completion::new();
            let hits = Arc::new(AtomicUsize::new(0));
            let start = Arc::new(Barrier::new(registrants + 1));
            let mut handles = Vec::with_capacity(registrants + 1);
            for _ in 0..registrants {
                let (c, hits, start) = (completion.clone(), Arc::clone(&hits), Arc::clone(&start));
                handles.push(thread::spawn(move || {
                    start.wait();
                    c.register(move |outcome| {
                        assert_eq!(outcome, Ok(11));
                        hits.fetch_add(1, Ordering::SeqCst);
                    });
                }));
            }
            let (c, start) = (completion.clone(), Arc::clone(&start));
            handles.push(thread::spawn(move || {
                start.wait();
                c.succeed(11);
            }));
            for h in handles {
                h.join().unwrap();
            }
            prop_assert_eq!(hits.load(Ordering::SeqCst), registrants);
        }
    }
}
