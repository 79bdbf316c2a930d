use msg_pool::{Config, Dispatcher};
use std::time::{Duration, Instant};

fn main() {
    let now = Instant::now();
    let dispatcher: Dispatcher<u64, u64> =
        Dispatcher::with_config(Config::new(4, 1024, false, Duration::ZERO)).unwrap();

    let token = dispatcher.create_token();
    let _ = dispatcher.send_request(token, 21, |x| x * 2);
    let reply = dispatcher.recv_timeout(token, Duration::from_secs(1));
    println!("reply: {:?}", reply);

    let _ = dispatcher.send_async(7, |x| {
        println!("fire-and-forget got {}", x);
        x
    });

    dispatcher.shutdown();
    println!("elapsed: {:?}", now.elapsed());
}
