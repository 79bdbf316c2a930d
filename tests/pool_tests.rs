#[cfg(test)]
mod tests {
    use msg_pool::{
        errors::TaskError,
        pool::{ChannelExecutor, Config, Executor, PanicPolicy, TaskPoolExecutor},
        task::Task,
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn counting_task(counter: &Arc<AtomicUsize>) -> Task<()> {
        let counter = counter.clone();
        Task::new(
            move |_args: Vec<()>| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            vec![],
        )
    }

    fn sleeping_task(counter: &Arc<AtomicUsize>, dur: Duration) -> Task<()> {
        let counter = counter.clone();
        Task::new(
            move |_args: Vec<()>| {
                thread::sleep(dur);
                counter.fetch_add(1, Ordering::SeqCst);
            },
            vec![],
        )
    }

    #[test]
    fn test_all_tasks_run_exactly_once() {
        println!("\n=== TEST: Все задачи выполняются ровно один раз ===");
        let pool = TaskPoolExecutor::new(Config::new(4, 100, false, Duration::ZERO)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            pool.execute(counting_task(&counter)).unwrap();
        }
        // graceful остановка с нулевым ожиданием дорабатывает всю очередь
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 50);
        println!("  ✓ 50/50 задач выполнено");
    }

    #[test]
    fn test_cancel_before_dequeue() {
        println!("\n=== TEST: Отмена задачи до выборки воркером ===");
        let pool = TaskPoolExecutor::new(Config::new(1, 100, false, Duration::ZERO)).unwrap();
        let blocker = Arc::new(AtomicUsize::new(0));
        let counter = Arc::new(AtomicUsize::new(0));

        // единственный воркер занят, очередная задача лежит в очереди
        pool.execute(sleeping_task(&blocker, Duration::from_millis(200)))
            .unwrap();
        let task = counting_task(&counter);
        let handle = task.handle();
        pool.execute(task).unwrap();
        handle.cancel();

        pool.shutdown();
        assert_eq!(blocker.load(Ordering::SeqCst), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 0, "отменённая задача не выполняется");
        println!("  ✓ Отменённая до выборки задача пропущена");
    }

    #[test]
    fn test_execute_after_shutdown_fails_fast() {
        println!("\n=== TEST: Постановка после остановки ===");
        let pool = TaskPoolExecutor::new(Config::new(2, 10, false, Duration::ZERO)).unwrap();
        pool.shutdown();
        pool.shutdown(); // идемпотентно

        let counter = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();
        let err = pool.execute(counting_task(&counter)).unwrap_err();
        assert_eq!(err, TaskError::Stopped);
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "отказ должен быть немедленным, без блокировки"
        );
        println!("  ✓ Stopped возвращается сразу");
    }

    #[test]
    fn test_try_execute_rejects_when_full() {
        println!("\n=== TEST: Неблокирующая постановка при полной очереди ===");
        let pool = TaskPoolExecutor::new(Config::new(1, 1, false, Duration::ZERO)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.execute(sleeping_task(&counter, Duration::from_millis(300)))
            .unwrap();
        // даём воркеру забрать первую задачу, затем заполняем очередь
        thread::sleep(Duration::from_millis(50));
        pool.try_execute(counting_task(&counter)).unwrap();

        let err = pool.try_execute(counting_task(&counter)).unwrap_err();
        assert_eq!(err, TaskError::Full);

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        println!("  ✓ Full при заполненной очереди, остальное доработано");
    }

    #[test]
    fn test_shutdown_now_abandons_queue() {
        println!("\n=== TEST: Немедленная остановка бросает очередь ===");
        let pool = TaskPoolExecutor::new(Config::new(2, 100, true, Duration::ZERO)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..40 {
            pool.execute(sleeping_task(&counter, Duration::from_millis(50)))
                .unwrap();
        }
        thread::sleep(Duration::from_millis(75));
        pool.shutdown();

        let done = counter.load(Ordering::SeqCst);
        assert!(done > 0, "в полёте что-то было");
        assert!(done < 40, "очередь должна быть брошена, выполнено {}", done);
        println!("  ✓ Выполнено {}/40, остальное брошено", done);
    }

    #[test]
    fn test_graceful_wait_forces_stop() {
        println!("\n=== TEST: Остановка с таймером ожидания ===");
        let pool =
            TaskPoolExecutor::new(Config::new(1, 100, false, Duration::from_millis(100))).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            pool.execute(sleeping_task(&counter, Duration::from_millis(50)))
                .unwrap();
        }

        let start = Instant::now();
        pool.shutdown();
        assert!(
            start.elapsed() < Duration::from_millis(50),
            "shutdown с таймером не должен блокировать вызывающего"
        );

        thread::sleep(Duration::from_millis(400));
        let done = counter.load(Ordering::SeqCst);
        assert!(done >= 1);
        assert!(done < 20, "таймер обязан остановить доработку, выполнено {}", done);
        println!("  ✓ Выполнено {}/20 за окно ожидания", done);
    }

    #[test]
    fn test_panic_recovered_keeps_worker_alive() {
        println!("\n=== TEST: Паника callback не убивает воркера ===");
        let mut config = Config::new(1, 10, false, Duration::ZERO);
        config.panic_policy = PanicPolicy::Recover;
        let pool = TaskPoolExecutor::new(config).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.execute(Task::new(
            |_args: Vec<()>| panic!("task blew up"),
            vec![],
        ))
        .unwrap();
        pool.execute(counting_task(&counter)).unwrap();
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 1, "воркер должен пережить панику");
        println!("  ✓ Воркер продолжил работу после паники");
    }

    #[test]
    fn test_task_delay_is_applied() {
        println!("\n=== TEST: Настраиваемая пауза перед выполнением ===");
        let mut config = Config::new(1, 10, false, Duration::ZERO);
        config.task_delay = Duration::from_millis(80);
        let pool = TaskPoolExecutor::new(config).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let start = Instant::now();
        pool.execute(counting_task(&counter)).unwrap();
        pool.shutdown();
        assert!(start.elapsed() >= Duration::from_millis(80));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        println!("  ✓ Пауза выдержана");
    }

    #[test]
    fn test_config_validation() {
        println!("\n=== TEST: Ошибка конфигурации на старте ===");
        let config = Config::new(0, 10, false, Duration::ZERO);
        match TaskPoolExecutor::<()>::new(config) {
            Err(TaskError::Config(msg)) => {
                println!("  ✓ Отклонено: {}", msg);
            }
            Ok(_) => panic!("pool_size = 0 должен быть ошибкой конфигурации"),
            Err(e) => panic!("ожидали Config, получили {:?}", e),
        }
    }

    #[test]
    fn test_metrics_snapshot() {
        println!("\n=== TEST: Снимок метрик пула ===");
        let pool = TaskPoolExecutor::<()>::new(Config::new(2, 8, false, Duration::ZERO)).unwrap();
        let metrics = pool.metrics();
        assert_eq!(metrics.queued, 0);
        assert_eq!(metrics.capacity, Some(8));
        assert_eq!(metrics.workers, 2);
        assert!(!metrics.stopped);
        assert_eq!(metrics.saturation(), 0.0);

        pool.shutdown();
        let metrics = pool.metrics();
        assert!(metrics.stopped);
        assert_eq!(metrics.workers, 0, "после остановки воркеров не остаётся");
        println!("  ✓ Метрики согласованы с жизненным циклом");
    }

    #[test]
    fn test_channel_executor_produce_consume() {
        println!("\n=== TEST: Исполнитель-очередь без воркеров ===");
        let executor = ChannelExecutor::new(8);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            executor.execute(counting_task(&counter)).unwrap();
        }

        let rx = executor.receiver();
        while let Ok(task) = rx.try_recv() {
            task.call();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        executor.shutdown();
        executor.shutdown();
        assert!(executor.is_stopped());
        let err = executor.execute(counting_task(&counter)).unwrap_err();
        assert_eq!(err, TaskError::Stopped);
        println!("  ✓ Потребитель дорабатывает очередь, после остановки Stopped");
    }
}
