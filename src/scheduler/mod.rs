/// 경매 상태 스케줄러
/// 1. LifecycleSweeper: 종료 시각이 지난 경매를 finished로 표시 (종료 표시의 주 기록자)
/// 2. LiveAuction: 화면 하나를 위한 카운트다운 + 변경 알림 반영
/// 두 작업 모두 핸들을 drop하면 취소된다.
// region:    --- Imports
use crate::auction::lifecycle::mark_finished_if_due;
use crate::auction::view::AuctionView;
use crate::clock::Clock;
use crate::error::AppError;
use crate::notify::{publish_or_warn, ChangeEvent, ChangeHub, ChangeNotifier, Subscription, Topic};
use crate::store::AuctionRepository;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Lifecycle Sweeper
#[derive(Clone)]
pub struct LifecycleSweeper {
    auctions: Arc<dyn AuctionRepository>,
    notifier: Arc<dyn ChangeNotifier>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl LifecycleSweeper {
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        notifier: Arc<dyn ChangeNotifier>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        Self {
            auctions,
            notifier,
            clock,
            period,
        }
    }

    /// 주기 실행 시작
    pub fn start(&self) -> SweeperHandle {
        let sweeper = self.clone();
        info!(
            "{:<12} --> 경매 종료 스케줄러 시작 (주기 {:?})",
            "Scheduler", sweeper.period
        );
        let task = tokio::spawn(async move {
            let mut ticker = interval(sweeper.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = sweeper.sweep_once().await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });
        SweeperHandle { task }
    }

    /// 한 번 훑기. 이번에 종료 처리한 경매 수를 반환.
    pub async fn sweep_once(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        let mut finished = 0;
        let mut failed = 0;
        // 한 경매의 실패가 나머지 경매의 종료 처리를 막지 않는다
        for mut auction in self.auctions.list_due_unfinished(now).await? {
            match mark_finished_if_due(self.auctions.as_ref(), &mut auction, now).await {
                Ok(true) => {
                    finished += 1;
                    publish_or_warn(
                        self.notifier.as_ref(),
                        ChangeEvent::AuctionFinished {
                            auction_id: auction.id,
                            timestamp: now,
                        },
                    )
                    .await;
                }
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    warn!(
                        "{:<12} --> 경매 {} 종료 처리 실패: {:?}",
                        "Scheduler", auction.id, e
                    );
                }
            }
        }
        if failed > 0 {
            error!(
                "{:<12} --> 경매 {}건 종료 처리 실패 (다음 주기에 재시도)",
                "Scheduler", failed
            );
        }
        if finished > 0 {
            info!("{:<12} --> 경매 {}건 종료 처리", "Scheduler", finished);
        } else {
            debug!("{:<12} --> 종료 처리할 경매 없음", "Scheduler");
        }
        Ok(finished)
    }
}

/// 스케줄러 핸들 (drop 시 중지)
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {}

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!("{:<12} --> 경매 종료 스케줄러 중지", "Scheduler");
    }
}
// endregion: --- Lifecycle Sweeper

// region:    --- Live Auction
/// 경매 상세 화면 하나의 실시간 뷰
pub struct LiveAuction {
    auction_id: i64,
    view: watch::Receiver<AuctionView>,
    task: JoinHandle<()>,
    _subscription: Subscription,
}

impl LiveAuction {
    /// 경매를 읽어 첫 뷰를 만든 뒤, 주기 갱신과 변경 알림 구독을 시작한다
    pub async fn open(
        auctions: Arc<dyn AuctionRepository>,
        hub: &ChangeHub,
        clock: Arc<dyn Clock>,
        auction_id: i64,
        period: Duration,
    ) -> Result<Self, AppError> {
        let auction = auctions
            .find_by_id(auction_id)
            .await?
            .ok_or_else(|| AppError::not_found("경매", auction_id))?;
        let (view_tx, view_rx) = watch::channel(AuctionView::build(&auction, clock.now()));

        // 콜백은 동기이므로 신호만 보내고, 다시 읽기는 작업 안에서 한다
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
        let subscription = hub.subscribe(Topic::Auction(auction_id), move |_| {
            let _ = refresh_tx.try_send(());
        });

        let task = tokio::spawn(async move {
            let mut auction = auction;
            // 첫 뷰는 이미 보냈으므로 한 주기 뒤부터 갱신
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    signal = refresh_rx.recv() => {
                        if signal.is_none() {
                            break;
                        }
                        match auctions.find_by_id(auction_id).await {
                            Ok(Some(latest)) => auction = latest,
                            Ok(None) => {
                                warn!("{:<12} --> 경매가 사라졌습니다 id: {}", "LiveView", auction_id);
                                break;
                            }
                            Err(e) => {
                                warn!("{:<12} --> 경매 재조회 실패 id: {} ({})", "LiveView", auction_id, e);
                            }
                        }
                    }
                }
                if view_tx.send(AuctionView::build(&auction, clock.now())).is_err() {
                    break;
                }
            }
        });

        debug!("{:<12} --> 실시간 뷰 시작 id: {}", "LiveView", auction_id);
        Ok(Self {
            auction_id,
            view: view_rx,
            task,
            _subscription: subscription,
        })
    }

    pub fn auction_id(&self) -> i64 {
        self.auction_id
    }

    /// 최신 뷰
    pub fn current(&self) -> AuctionView {
        self.view.borrow().clone()
    }

    /// 새 뷰가 나올 때까지 대기. 뷰가 닫혔으면 false.
    pub async fn changed(&mut self) -> bool {
        self.view.changed().await.is_ok()
    }

    pub fn close(self) {}

    pub fn is_open(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for LiveAuction {
    fn drop(&mut self) {
        self.task.abort();
        debug!("{:<12} --> 실시간 뷰 종료 id: {}", "LiveView", self.auction_id);
    }
}
// endregion: --- Live Auction
