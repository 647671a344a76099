//! Initial database migration.
//!
//! Creates the reservation, payment ledger and cancellation tables, their
//! enums, the no-overlap exclusion constraint and the refund-entry guard.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS & ENUMS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(RESERVATIONS_SQL).await?;
        db.execute_unprepared(PAYMENT_ENTRIES_SQL).await?;
        db.execute_unprepared(CANCELLATIONS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EXTENSIONS_SQL: &str = r"
-- Needed to combine '=' on uuid with '&&' on daterange in one GiST index
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
CREATE TYPE reservation_status AS ENUM (
    'pending',
    'confirmed',
    'in_progress',
    'finished',
    'cancelled',
    'no_show'
);

CREATE TYPE payment_method AS ENUM ('cash', 'card', 'bank_transfer', 'other');

CREATE TYPE payment_kind AS ENUM ('payment', 'refund');

CREATE TYPE refund_status AS ENUM (
    'not_applicable',
    'pending',
    'processed',
    'completed',
    'rejected'
);
";

const RESERVATIONS_SQL: &str = r"
CREATE TABLE reservations (
    id UUID PRIMARY KEY,
    client_name VARCHAR(255) NOT NULL,
    client_surname VARCHAR(255) NOT NULL,
    client_email VARCHAR(255),
    client_phone VARCHAR(50),
    client_document VARCHAR(100),
    room_id UUID NOT NULL,
    check_in DATE NOT NULL,
    check_out DATE NOT NULL,
    price_per_night_cents BIGINT NOT NULL,
    total_price_cents BIGINT NOT NULL,
    status reservation_status NOT NULL DEFAULT 'pending',
    amount_paid_cents BIGINT NOT NULL DEFAULT 0,
    paid BOOLEAN NOT NULL DEFAULT false,
    check_in_at TIMESTAMPTZ,
    check_out_at TIMESTAMPTZ,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version BIGINT NOT NULL DEFAULT 1,

    CONSTRAINT chk_stay_dates CHECK (check_out > check_in),
    CONSTRAINT chk_price_positive CHECK (price_per_night_cents > 0),
    CONSTRAINT chk_version_positive CHECK (version > 0),
    CONSTRAINT reservations_no_overlap EXCLUDE USING gist (
        room_id WITH =,
        daterange(check_in, check_out, '[)') WITH &&
    ) WHERE (status <> 'cancelled')
);

-- Conflict checks and room calendars
CREATE INDEX idx_reservations_room_dates ON reservations(room_id, check_in, check_out);

-- Front desk lists by status
CREATE INDEX idx_reservations_status ON reservations(status, check_in);
";

const PAYMENT_ENTRIES_SQL: &str = r"
CREATE TABLE payment_entries (
    id UUID PRIMARY KEY,
    reservation_id UUID NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    kind payment_kind NOT NULL DEFAULT 'payment',
    amount_cents BIGINT NOT NULL,
    method payment_method NOT NULL,
    note TEXT,
    recorded_at TIMESTAMPTZ NOT NULL,
    recorded_by UUID NOT NULL,
    edited_by UUID,
    edited_at TIMESTAMPTZ,
    edit_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_amount_nonzero CHECK (amount_cents <> 0),
    CONSTRAINT chk_kind_sign CHECK (
        (kind = 'payment' AND amount_cents > 0) OR (kind = 'refund' AND amount_cents < 0)
    ),
    CONSTRAINT chk_edit_audit CHECK (
        (edited_by IS NULL AND edited_at IS NULL AND edit_reason IS NULL)
        OR (edited_by IS NOT NULL AND edited_at IS NOT NULL AND edit_reason IS NOT NULL)
    ),
    CONSTRAINT uq_payment_position UNIQUE (reservation_id, position)
);

CREATE INDEX idx_payment_entries_reservation ON payment_entries(reservation_id, position);
";

const CANCELLATIONS_SQL: &str = r"
CREATE TABLE cancellations (
    id UUID PRIMARY KEY,
    reservation_id UUID NOT NULL UNIQUE REFERENCES reservations(id),
    snapshot JSONB NOT NULL,
    reason TEXT NOT NULL,
    cancelled_by UUID NOT NULL,
    cancelled_at TIMESTAMPTZ NOT NULL,
    refund_status refund_status NOT NULL,
    refund_amount_cents BIGINT,
    refund_method payment_method,
    refund_processed_by UUID,
    refund_processed_at TIMESTAMPTZ,
    refund_note TEXT,
    refund_payment_id UUID REFERENCES payment_entries(id),
    completed_by UUID,
    completed_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_reason_not_blank CHECK (btrim(reason) <> ''),
    CONSTRAINT chk_refund_details CHECK (
        refund_status NOT IN ('processed', 'completed')
        OR (refund_amount_cents > 0 AND refund_method IS NOT NULL AND refund_payment_id IS NOT NULL)
    )
);

CREATE INDEX idx_cancellations_refund_status ON cancellations(refund_status, cancelled_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_refund_entry_modification
-- Refund entries are written once by the cancellation workflow
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_refund_entry_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.kind = 'refund' THEN
        RAISE EXCEPTION 'Refund entry % cannot be modified', OLD.id;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_refund_entry_mod
BEFORE UPDATE OR DELETE ON payment_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_refund_entry_modification();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS cancellations CASCADE;
DROP TABLE IF EXISTS payment_entries CASCADE;
DROP TABLE IF EXISTS reservations CASCADE;
DROP FUNCTION IF EXISTS prevent_refund_entry_modification() CASCADE;
DROP TYPE IF EXISTS refund_status;
DROP TYPE IF EXISTS payment_kind;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS reservation_status;
";
