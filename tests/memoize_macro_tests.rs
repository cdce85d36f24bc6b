use std::cell::Cell;
use std::sync::Arc;

use memoria::memoize;

thread_local! {
    static FIB_CALLS: Cell<u32> = Cell::new(0);
    static SQUARE_CALLS: Cell<u32> = Cell::new(0);
    static PARSE_CALLS: Cell<u32> = Cell::new(0);
    static STRICT_PARSE_CALLS: Cell<u32> = Cell::new(0);
    static FAILING_CALLS: Cell<u32> = Cell::new(0);
    static AREA_CALLS: Cell<u32> = Cell::new(0);
    static GREET_CALLS: Cell<u32> = Cell::new(0);
    static OPEN_CALLS: Cell<u32> = Cell::new(0);
    static TICK_CALLS: Cell<u32> = Cell::new(0);
}

fn bump(counter: &'static std::thread::LocalKey<Cell<u32>>) {
    counter.with(|c| c.set(c.get() + 1));
}

fn count(counter: &'static std::thread::LocalKey<Cell<u32>>) -> u32 {
    counter.with(|c| c.get())
}

#[memoize]
fn fibonacci(n: u64) -> u64 {
    bump(&FIB_CALLS);
    if n < 2 {
        return n;
    }
    fibonacci(n - 1) + fibonacci(n - 2)
}

#[test]
fn test_recursive_function_computes_each_input_once() {
    assert_eq!(fibonacci(30), 832_040);
    assert_eq!(count(&FIB_CALLS), 31);

    assert_eq!(fibonacci(30), 832_040);
    assert_eq!(count(&FIB_CALLS), 31);
}

#[memoize(max_size = 2)]
fn square(n: u32) -> u32 {
    bump(&SQUARE_CALLS);
    n * n
}

#[test]
fn test_bounded_cache_evicts_least_recently_used() {
    square(1);
    square(2);
    square(1); // hit, 2 becomes least recently used
    square(3); // evicts 2
    assert_eq!(count(&SQUARE_CALLS), 3);

    square(1);
    square(3);
    assert_eq!(count(&SQUARE_CALLS), 3);

    assert_eq!(square(2), 4);
    assert_eq!(count(&SQUARE_CALLS), 4);
}

#[memoize]
fn parse_port(text: String) -> Result<u16, String> {
    bump(&PARSE_CALLS);
    text.parse::<u16>().map_err(|e| format!("{}: {}", text, e))
}

#[test]
fn test_failures_not_cached_by_default() {
    assert_eq!(parse_port("8080".to_string()), Ok(8080));
    assert_eq!(parse_port("8080".to_string()), Ok(8080));
    assert_eq!(count(&PARSE_CALLS), 1);

    assert!(parse_port("http".to_string()).is_err());
    assert!(parse_port("http".to_string()).is_err());
    assert_eq!(count(&PARSE_CALLS), 3);
}

#[memoize(cache_failures = true)]
fn strict_parse(text: &'static str) -> Result<u16, String> {
    bump(&STRICT_PARSE_CALLS);
    text.parse::<u16>().map_err(|e| e.to_string())
}

#[test]
fn test_failures_cached_when_enabled() {
    let first = strict_parse("http");
    let second = strict_parse("http");
    assert!(first.is_err());
    assert_eq!(first, second);
    assert_eq!(count(&STRICT_PARSE_CALLS), 1);
}

#[memoize(max_size = 2, cache_failures = true)]
fn always_fails(n: i32) -> Result<(), String> {
    bump(&FAILING_CALLS);
    Err(format!("attempt {} for {}", count(&FAILING_CALLS), n))
}

#[test]
fn test_cached_failures_are_evicted_like_successes() {
    let original = always_fails(1);
    always_fails(2).unwrap_err();
    always_fails(3).unwrap_err();
    assert_eq!(count(&FAILING_CALLS), 3);

    let recomputed = always_fails(1);
    assert_eq!(count(&FAILING_CALLS), 4);
    assert_ne!(original, recomputed);
}

#[derive(Debug, Clone)]
struct Rectangle {
    width: u32,
    height: u32,
}

impl Rectangle {
    #[memoize]
    fn area(&self) -> u32 {
        bump(&AREA_CALLS);
        self.width * self.height
    }

    #[memoize(max_size = 4)]
    fn scaled(&self, factor: u32) -> Rectangle {
        Rectangle {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

#[test]
fn test_method_receiver_is_part_of_key() {
    let small = Rectangle {
        width: 2,
        height: 3,
    };
    let large = Rectangle {
        width: 20,
        height: 30,
    };

    assert_eq!(small.area(), 6);
    assert_eq!(small.area(), 6);
    assert_eq!(count(&AREA_CALLS), 1);

    assert_eq!(large.area(), 600);
    assert_eq!(count(&AREA_CALLS), 2);

    // an equal-valued receiver shares the cached outcome
    assert_eq!(small.clone().area(), 6);
    assert_eq!(count(&AREA_CALLS), 2);
}

#[test]
fn test_method_returning_struct() {
    let rect = Rectangle {
        width: 1,
        height: 2,
    };
    let scaled = rect.scaled(3);
    assert_eq!((scaled.width, scaled.height), (3, 6));
}

#[memoize(name = "greeting")]
fn greet(first: &str, last: &str) -> String {
    bump(&GREET_CALLS);
    format!("Hello, {} {}", first, last)
}

#[test]
fn test_argument_boundaries_are_part_of_key() {
    assert_eq!(greet("ab", "c"), "Hello, ab c");
    assert_eq!(greet("a", "bc"), "Hello, a bc");
    assert_eq!(count(&GREET_CALLS), 2);

    assert_eq!(greet("a", "bc"), "Hello, a bc");
    assert_eq!(count(&GREET_CALLS), 2);
}

#[test]
fn test_thread_scope_caches_are_per_thread() {
    assert_eq!(square(7), 49);
    let calls_here = count(&SQUARE_CALLS);

    let calls_there = std::thread::spawn(|| {
        assert_eq!(square(7), 49);
        count(&SQUARE_CALLS)
    })
    .join()
    .unwrap();

    assert_eq!(calls_here, 1);
    assert_eq!(calls_there, 1);
}

#[memoize(cache_failures = true)]
fn open_device(path: &'static str) -> Result<u32, Arc<String>> {
    bump(&OPEN_CALLS);
    Err(Arc::new(format!("{} is busy", path)))
}

#[test]
fn test_arc_error_keeps_failure_identity() {
    let first = open_device("/dev/tty0").unwrap_err();
    let second = open_device("/dev/tty0").unwrap_err();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(count(&OPEN_CALLS), 1);
}

#[derive(Debug)]
struct Ticker {
    ticks: u32,
}

impl Ticker {
    #[memoize]
    fn tick(&mut self, step: u32) -> u32 {
        bump(&TICK_CALLS);
        self.ticks += step;
        self.ticks
    }
}

#[test]
fn test_mutating_method_misses_after_receiver_changes() {
    let mut ticker = Ticker { ticks: 0 };
    assert_eq!(ticker.tick(1), 1);
    // the receiver now debugs as `ticks: 1`, a new key
    assert_eq!(ticker.tick(1), 2);
    assert_eq!(count(&TICK_CALLS), 2);

    // an equal receiver state hits the stored outcome
    let mut fresh = Ticker { ticks: 0 };
    assert_eq!(fresh.tick(1), 1);
    assert_eq!(fresh.ticks, 0);
    assert_eq!(count(&TICK_CALLS), 2);
}
