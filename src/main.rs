use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

use gastrogo::board::service::BoardSnapshot;
use gastrogo::feed::parse_probability;
use gastrogo::repository::submit_cart;
use gastrogo::telemetry::create_session_span;
use gastrogo::{
    config, generate_correlation_id, init_telemetry, pump, spawn_board, BoardFilter,
    BoardNotification, Cart, Category, Dish, InMemoryOrderRepository, KitchenBoard, Menu,
    ModifierGroup, ModifierOption, OrderRepository, OrderStatus, SelectedModifier, SimulatedFeed, StatusEvent,
    SystemClock, TrackerView,
};

#[derive(Parser)]
#[command(name = "gastrogo")]
#[command(about = "Restaurant order lifecycle: kitchen display and customer tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kitchen board against a simulated order feed
    Simulate {
        /// Number of feed ticks before stopping
        #[arg(long, default_value = "30")]
        ticks: u64,
        /// Override the configured tick interval
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Override the configured RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Override the configured new-order probability, within [0, 1]
        #[arg(long, value_parser = parse_probability)]
        probability: Option<f64>,
    },
    /// Print the customer tracker for a demo order
    Track {
        /// Status the demo order has reached (received, confirmed, preparing, ...)
        #[arg(long, default_value = "preparing")]
        status: OrderStatus,
        /// How long ago the order was placed
        #[arg(long, default_value = "5")]
        minutes_ago: i64,
        /// Table number printed on the order
        #[arg(long, default_value = "5")]
        table: u32,
    },
    /// Print the demo menu by category
    Menu,
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config()?;
    init_telemetry(&config.observability)?;

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Simulate {
            ticks,
            tick_ms,
            seed,
            probability,
        } => runtime.block_on(simulate_command(ticks, tick_ms, seed, probability)),
        Commands::Track {
            status,
            minutes_ago,
            table,
        } => runtime.block_on(track_command(status, minutes_ago, table)),
        Commands::Menu => {
            print_menu(&demo_menu());
            Ok(())
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}

async fn simulate_command(
    ticks: u64,
    tick_ms: Option<u64>,
    seed: Option<u64>,
    probability: Option<f64>,
) -> Result<()> {
    let config = config()?;
    let correlation_id = generate_correlation_id();
    let span = create_session_span("simulate", &correlation_id);

    async move {
        let mut feed_config = config.feed.simulated();
        feed_config.max_ticks = Some(ticks);
        if let Some(ms) = tick_ms {
            feed_config.tick = std::time::Duration::from_millis(ms.max(1));
        }
        if seed.is_some() {
            feed_config.seed = seed;
        }
        if let Some(p) = probability {
            feed_config.new_order_probability = p;
        }

        let clock = Arc::new(SystemClock);
        let mut board = KitchenBoard::new(config.kitchen.thresholds());
        board.set_notifications(config.kitchen.notifications);

        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_board(board, clock.clone(), notify_tx, 64);

        let listener = tokio::spawn(async move {
            while let Some(note) = notify_rx.recv().await {
                match note {
                    BoardNotification::NewOrder { order_id, table_number } => {
                        println!("🔔 New order {order_id} for table {table_number}")
                    }
                    BoardNotification::OrderReady { order_id, table_number } => {
                        println!("✅ Order {order_id} ready for table {table_number}")
                    }
                }
            }
        });

        let mut feed = SimulatedFeed::new(feed_config, clock);
        let forwarded = pump(&mut feed, &handle).await?;

        // move everything that arrived one step so the board shows some spread
        let snapshot = handle.snapshot(BoardFilter::Active).await?;
        for view in &snapshot.orders {
            if let Err(e) = handle
                .change_status(&view.order_id, StatusEvent::Advance(OrderStatus::Confirmed))
                .await
            {
                tracing::warn!(error = %e, "Demo confirmation failed");
            }
        }

        let snapshot = handle.snapshot(BoardFilter::Active).await?;
        print_board(&snapshot);
        println!("{forwarded} feed events applied");

        drop(handle);
        task.await?;
        listener.await?;
        Ok(())
    }
    .instrument(span)
    .await
}

fn print_board(snapshot: &BoardSnapshot) {
    println!();
    println!(
        "KDS {}  pending {}  preparing {}  ready {}",
        snapshot.taken_at.format("%H:%M"),
        snapshot.counts.pending,
        snapshot.counts.preparing,
        snapshot.counts.ready
    );
    println!("order  | table | status     | elapsed | urgency  | next");
    println!("------ | ----- | ---------- | ------- | -------- | ---------------");
    for view in &snapshot.orders {
        println!(
            "{:<6} | {:>5} | {:<10} | {:>7} | {:<8} | {}",
            view.short_id,
            view.table_number,
            view.status_label,
            view.elapsed_display,
            format!("{:?}", view.urgency),
            view.next_action_label.unwrap_or("-")
        );
    }
}

fn demo_menu() -> Menu {
    let category = |id: &str, name: &str, icon: &str| Category {
        id: id.into(),
        name: name.into(),
        icon: icon.into(),
    };
    Menu::new(
        vec![
            category("cat-1", "Starters", "🥟"),
            category("cat-2", "Grill", "🥩"),
        ],
        vec![
            Dish::new("dish-1", "Provoleta", 3500)
                .in_category("Starters")
                .with_preparation_time(10)
                .with_modifier(ModifierGroup {
                    id: "mod-1".into(),
                    name: "Size".into(),
                    options: vec![
                        ModifierOption { name: "Single".into(), price_adjustment: 0 },
                        ModifierOption { name: "To share".into(), price_adjustment: 1500 },
                    ],
                }),
            Dish::new("dish-2", "Empanadas Criollas", 2800)
                .in_category("Starters")
                .with_preparation_time(8),
            Dish::new("dish-3", "Bife de Chorizo", 12500)
                .in_category("Grill")
                .with_preparation_time(25)
                .with_modifier(ModifierGroup {
                    id: "mod-2".into(),
                    name: "Doneness".into(),
                    options: ["Rare", "Medium", "Well done"]
                        .into_iter()
                        .map(|name| ModifierOption { name: name.into(), price_adjustment: 0 })
                        .collect(),
                }),
        ],
    )
}

fn print_menu(menu: &Menu) {
    for category in &menu.categories {
        println!("{} {} ({})", category.icon, category.name, menu.dish_count(category));
        for dish in menu.dishes_in(category) {
            let modifiers: Vec<String> = dish
                .modifiers
                .iter()
                .map(|g| {
                    let options: Vec<&str> = g.options.iter().map(|o| o.name.as_str()).collect();
                    format!("{}: {}", g.name, options.join("/"))
                })
                .collect();
            println!(
                "  {:<8} {:<20} ${:>6}  {:>2} min  {}",
                dish.id,
                dish.name,
                dish.price,
                dish.preparation_time,
                modifiers.join("; ")
            );
        }
    }
}

fn menu_dish<'a>(menu: &'a Menu, dish_id: &str) -> Result<&'a Dish> {
    menu.dish(dish_id)
        .ok_or_else(|| anyhow!("Dish {dish_id} is not on the menu"))
}

async fn track_command(target: OrderStatus, minutes_ago: i64, table: u32) -> Result<()> {
    let config = config()?;
    let repository = InMemoryOrderRepository::new();
    let now = Utc::now();
    let placed_at = now - Duration::minutes(minutes_ago.max(0));

    let menu = demo_menu();
    let mut cart = Cart::new();
    cart.add_item(
        menu_dish(&menu, "dish-1")?,
        1,
        vec![SelectedModifier::new("mod-1", "To share")],
        None,
    )?;
    cart.add_item(menu_dish(&menu, "dish-2")?, 2, Vec::new(), None)?;

    let mut order = submit_cart(&repository, &mut cart, table, placed_at).await?;

    if target == OrderStatus::Cancelled {
        order = repository
            .update_status(&order.id, StatusEvent::Advance(OrderStatus::Cancelled), now)
            .await?;
    } else {
        let mut steps = Vec::new();
        let mut cursor = order.status;
        while cursor != target {
            match cursor.next() {
                Some(next) => {
                    steps.push(next);
                    cursor = next;
                }
                None => break,
            }
        }
        let spacing = (now - placed_at) / (steps.len().max(1) as i32 + 1);
        for (i, status) in steps.into_iter().enumerate() {
            let at = placed_at + spacing * (i as i32 + 1);
            order = repository
                .update_status(&order.id, StatusEvent::Advance(status), at)
                .await?;
        }
    }

    let view = TrackerView::build(&order, now, config.tracker.estimated());
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
