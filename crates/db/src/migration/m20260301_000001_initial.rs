//! Initial schema for the Hisaab posting core.
//!
//! Creates enums, the chart of accounts, the account configuration catalog,
//! vouchers with their lines and ledger history, parties, invoices, notes,
//! payments, the balance trigger and row-level security policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNT_GROUPS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: ACCOUNT CONFIGURATION
        // ============================================================
        db.execute_unprepared(ACCOUNT_CONFIGURATION_KEYS_SQL).await?;
        db.execute_unprepared(ACCOUNT_CONFIGURATIONS_SQL).await?;

        // ============================================================
        // PART 4: VOUCHERS & LEDGER
        // ============================================================
        db.execute_unprepared(VOUCHER_TYPES_SQL).await?;
        db.execute_unprepared(VOUCHERS_SQL).await?;
        db.execute_unprepared(VOUCHER_LINES_SQL).await?;
        db.execute_unprepared(LEDGERS_SQL).await?;

        // ============================================================
        // PART 5: PARTIES & DOCUMENTS
        // ============================================================
        db.execute_unprepared(PARTIES_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(NOTES_SQL).await?;

        // ============================================================
        // PART 6: PAYMENTS
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(PAYMENT_DETAILS_SQL).await?;
        db.execute_unprepared(PAYMENT_ALLOCATIONS_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 8: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

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

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense'
);

CREATE TYPE party_type AS ENUM (
    'CUSTOMER',
    'SUPPLIER',
    'PATIENT',
    'EMPLOYEE',
    'BANK',
    'OTHER'
);

CREATE TYPE invoice_kind AS ENUM (
    'SALES_INVOICE',
    'PURCHASE_INVOICE',
    'TEST_INVOICE'
);

CREATE TYPE invoice_status AS ENUM (
    'DRAFT',
    'POSTED',
    'PARTIALLY_PAID',
    'PAID',
    'CANCELLED'
);

CREATE TYPE invoice_payment_status AS ENUM (
    'UNPAID',
    'PARTIAL',
    'PAID',
    'OVERPAID'
);

CREATE TYPE note_type AS ENUM ('CREDIT_NOTE', 'DEBIT_NOTE');

CREATE TYPE payment_type AS ENUM ('RECEIPT', 'PAYMENT', 'CONTRA');

CREATE TYPE payment_status AS ENUM (
    'DRAFT',
    'POSTED',
    'CANCELLED',
    'RECONCILED'
);
";

const ACCOUNT_GROUPS_SQL: &str = r"
CREATE TABLE account_groups (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id       UUID NOT NULL,
    code            VARCHAR(20) NOT NULL,
    name            VARCHAR(255) NOT NULL,
    account_type    account_type NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_account_groups_tenant_code UNIQUE (tenant_id, code)
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id           UUID NOT NULL,
    group_id            UUID NOT NULL REFERENCES account_groups(id),
    code                VARCHAR(50) NOT NULL,
    name                VARCHAR(255) NOT NULL,
    account_type        account_type NOT NULL,
    opening_balance     NUMERIC(19, 2) NOT NULL DEFAULT 0,
    current_balance     NUMERIC(19, 2) NOT NULL DEFAULT 0,
    ledger_version      BIGINT NOT NULL DEFAULT 0,
    system_code         VARCHAR(100),
    is_system_account   BOOLEAN NOT NULL DEFAULT false,
    is_active           BOOLEAN NOT NULL DEFAULT true,
    is_deleted          BOOLEAN NOT NULL DEFAULT false,
    created_by          UUID NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_accounts_tenant_code UNIQUE (tenant_id, code),
    -- NULL system codes never collide, so hand-made accounts are unaffected
    CONSTRAINT uq_accounts_tenant_system_code UNIQUE (tenant_id, system_code),
    CONSTRAINT chk_accounts_ledger_version CHECK (ledger_version >= 0)
);

CREATE INDEX idx_accounts_tenant ON accounts(tenant_id);
CREATE INDEX idx_accounts_group ON accounts(group_id);
";

const ACCOUNT_CONFIGURATION_KEYS_SQL: &str = r"
-- Global catalog of posting roles, shared by every tenant
CREATE TABLE account_configuration_keys (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code                VARCHAR(50) NOT NULL,
    name                VARCHAR(255) NOT NULL,
    description         TEXT,
    account_type        account_type NOT NULL,
    default_account_id  UUID REFERENCES accounts(id),
    is_active           BOOLEAN NOT NULL DEFAULT true,
    is_deleted          BOOLEAN NOT NULL DEFAULT false,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_account_configuration_keys_code UNIQUE (code)
);
";

const ACCOUNT_CONFIGURATIONS_SQL: &str = r"
CREATE TABLE account_configurations (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id       UUID NOT NULL,
    key_id          UUID NOT NULL REFERENCES account_configuration_keys(id),
    account_id      UUID NOT NULL REFERENCES accounts(id),
    created_by      UUID NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_account_configurations_tenant_key UNIQUE (tenant_id, key_id)
);
";

const VOUCHER_TYPES_SQL: &str = r"
CREATE TABLE voucher_types (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id       UUID NOT NULL,
    code            VARCHAR(10) NOT NULL,
    name            VARCHAR(100) NOT NULL,
    prefix          VARCHAR(10) NOT NULL,
    -- Locked FOR UPDATE while a voucher number is taken
    next_number     BIGINT NOT NULL DEFAULT 1,
    is_active       BOOLEAN NOT NULL DEFAULT true,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_voucher_types_tenant_code UNIQUE (tenant_id, code),
    CONSTRAINT chk_voucher_types_next_number CHECK (next_number > 0)
);
";

const VOUCHERS_SQL: &str = r"
CREATE TABLE vouchers (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id               UUID NOT NULL,
    voucher_type_id         UUID NOT NULL REFERENCES voucher_types(id),
    voucher_number          VARCHAR(50) NOT NULL,
    voucher_date            DATE NOT NULL,
    currency                VARCHAR(3) NOT NULL,
    exchange_rate           NUMERIC(19, 6) NOT NULL DEFAULT 1,
    total_amount_base       NUMERIC(19, 2) NOT NULL,
    total_amount_foreign    NUMERIC(19, 2) NOT NULL,
    reference_type          VARCHAR(50) NOT NULL,
    reference_id            UUID,
    reference_number        VARCHAR(100),
    narration               TEXT,
    is_posted               BOOLEAN NOT NULL DEFAULT true,
    is_reversal             BOOLEAN NOT NULL DEFAULT false,
    reversed_voucher_id     UUID REFERENCES vouchers(id),
    reversal_voucher_id     UUID REFERENCES vouchers(id),
    created_by              UUID NOT NULL,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_vouchers_tenant_number UNIQUE (tenant_id, voucher_number),
    CONSTRAINT chk_vouchers_exchange_rate CHECK (exchange_rate > 0),
    CONSTRAINT chk_vouchers_reversal_link CHECK (
        (is_reversal AND reversed_voucher_id IS NOT NULL)
        OR (NOT is_reversal AND reversed_voucher_id IS NULL)
    )
);

CREATE INDEX idx_vouchers_tenant_date ON vouchers(tenant_id, voucher_date);
CREATE INDEX idx_vouchers_reference ON vouchers(tenant_id, reference_type, reference_id);
";

const VOUCHER_LINES_SQL: &str = r"
CREATE TABLE voucher_lines (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id           UUID NOT NULL,
    voucher_id          UUID NOT NULL REFERENCES vouchers(id),
    line_no             INTEGER NOT NULL,
    account_id          UUID NOT NULL REFERENCES accounts(id),
    debit_base          NUMERIC(19, 2) NOT NULL DEFAULT 0,
    credit_base         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    description         TEXT,
    tax_amount_base     NUMERIC(19, 2),
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_voucher_lines_voucher_line UNIQUE (voucher_id, line_no),
    CONSTRAINT chk_voucher_lines_line_no CHECK (line_no > 0),
    -- Exactly one side is non-zero
    CONSTRAINT chk_voucher_lines_one_side CHECK (
        (debit_base > 0 AND credit_base = 0)
        OR (credit_base > 0 AND debit_base = 0)
    )
);

CREATE INDEX idx_voucher_lines_account ON voucher_lines(account_id);
";

const LEDGERS_SQL: &str = r"
CREATE TABLE ledgers (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id           UUID NOT NULL,
    account_id          UUID NOT NULL REFERENCES accounts(id),
    voucher_id          UUID NOT NULL REFERENCES vouchers(id),
    voucher_line_id     UUID NOT NULL REFERENCES voucher_lines(id),
    transaction_date    DATE NOT NULL,
    debit_amount        NUMERIC(19, 2) NOT NULL DEFAULT 0,
    credit_amount       NUMERIC(19, 2) NOT NULL DEFAULT 0,
    account_version     BIGINT NOT NULL,
    previous_balance    NUMERIC(19, 2) NOT NULL,
    balance             NUMERIC(19, 2) NOT NULL,
    narration           TEXT,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_ledgers_account_version UNIQUE (account_id, account_version)
);

CREATE INDEX idx_ledgers_voucher ON ledgers(voucher_id);
";

const PARTIES_SQL: &str = r"
CREATE TABLE parties (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id       UUID NOT NULL,
    party_no        BIGSERIAL NOT NULL,
    party_type      party_type NOT NULL,
    name            VARCHAR(255) NOT NULL,
    is_active       BOOLEAN NOT NULL DEFAULT true,
    is_deleted      BOOLEAN NOT NULL DEFAULT false,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_parties_party_no UNIQUE (party_no)
);

CREATE INDEX idx_parties_tenant_type ON parties(tenant_id, party_type);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id           UUID NOT NULL,
    invoice_kind        invoice_kind NOT NULL,
    invoice_number      VARCHAR(50) NOT NULL,
    party_type          party_type NOT NULL,
    party_id            UUID NOT NULL REFERENCES parties(id),
    invoice_date        DATE NOT NULL,
    due_date            DATE,
    currency            VARCHAR(3) NOT NULL,
    exchange_rate       NUMERIC(19, 6) NOT NULL DEFAULT 1,
    gst_rate            NUMERIC(7, 4) NOT NULL DEFAULT 0,
    is_interstate       BOOLEAN NOT NULL DEFAULT false,
    subtotal            NUMERIC(19, 2) NOT NULL,
    cgst_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    sgst_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    igst_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    cess_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    tax_amount          NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total_amount        NUMERIC(19, 2) NOT NULL,
    paid_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    balance_amount      NUMERIC(19, 2) NOT NULL,
    notes_total         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    status              invoice_status NOT NULL DEFAULT 'DRAFT',
    payment_status      invoice_payment_status NOT NULL DEFAULT 'UNPAID',
    voucher_id          UUID REFERENCES vouchers(id),
    narration           TEXT,
    is_deleted          BOOLEAN NOT NULL DEFAULT false,
    created_by          UUID NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by          UUID,
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_invoices_tenant_kind_number UNIQUE (tenant_id, invoice_kind, invoice_number),
    CONSTRAINT chk_invoices_total CHECK (total_amount = subtotal + tax_amount),
    CONSTRAINT chk_invoices_balance CHECK (balance_amount = total_amount - paid_amount),
    CONSTRAINT chk_invoices_posted_voucher CHECK (
        status IN ('DRAFT', 'CANCELLED') OR voucher_id IS NOT NULL
    )
);

CREATE INDEX idx_invoices_party ON invoices(tenant_id, party_id);
";

const NOTES_SQL: &str = r"
CREATE TABLE notes (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id           UUID NOT NULL,
    note_type           note_type NOT NULL,
    note_number         VARCHAR(50) NOT NULL,
    invoice_id          UUID NOT NULL REFERENCES invoices(id),
    party_type          party_type NOT NULL,
    party_id            UUID NOT NULL REFERENCES parties(id),
    note_date           DATE NOT NULL,
    subtotal            NUMERIC(19, 2) NOT NULL,
    cgst_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    sgst_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    igst_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    cess_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    tax_amount          NUMERIC(19, 2) NOT NULL DEFAULT 0,
    total_amount        NUMERIC(19, 2) NOT NULL,
    reason              TEXT,
    voucher_id          UUID NOT NULL REFERENCES vouchers(id),
    is_deleted          BOOLEAN NOT NULL DEFAULT false,
    created_by          UUID NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_notes_tenant_number UNIQUE (tenant_id, note_number)
);

CREATE INDEX idx_notes_invoice ON notes(invoice_id);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id                          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id                   UUID NOT NULL,
    payment_number              VARCHAR(50) NOT NULL,
    payment_type                payment_type NOT NULL,
    payment_date                DATE NOT NULL,
    party_type                  party_type,
    party_id                    UUID REFERENCES parties(id),
    currency                    VARCHAR(3) NOT NULL,
    exchange_rate               NUMERIC(19, 6) NOT NULL DEFAULT 1,
    total_amount_base           NUMERIC(19, 2) NOT NULL,
    total_amount_foreign        NUMERIC(19, 2) NOT NULL,
    allocated_amount_base       NUMERIC(19, 2) NOT NULL DEFAULT 0,
    unallocated_amount_base     NUMERIC(19, 2) NOT NULL,
    tds_amount_base             NUMERIC(19, 2) NOT NULL DEFAULT 0,
    advance_amount_base         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    is_advance                  BOOLEAN NOT NULL DEFAULT false,
    status                      payment_status NOT NULL DEFAULT 'DRAFT',
    is_reconciled               BOOLEAN NOT NULL DEFAULT false,
    reconciled_at               TIMESTAMPTZ,
    reconciled_by               UUID,
    voucher_id                  UUID REFERENCES vouchers(id),
    is_refund                   BOOLEAN NOT NULL DEFAULT false,
    original_payment_id         UUID REFERENCES payments(id),
    refund_payment_id           UUID REFERENCES payments(id),
    narration                   TEXT,
    is_deleted                  BOOLEAN NOT NULL DEFAULT false,
    created_by                  UUID NOT NULL,
    created_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by                  UUID,
    updated_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_payments_tenant_number UNIQUE (tenant_id, payment_number),
    CONSTRAINT chk_payments_allocation CHECK (
        allocated_amount_base >= 0
        AND unallocated_amount_base >= 0
        AND allocated_amount_base + unallocated_amount_base <= total_amount_base
    ),
    CONSTRAINT chk_payments_reconciled CHECK (NOT is_reconciled OR status = 'RECONCILED'),
    CONSTRAINT chk_payments_draft_voucher CHECK (status <> 'DRAFT' OR voucher_id IS NULL),
    CONSTRAINT chk_payments_refund CHECK (NOT is_refund OR original_payment_id IS NOT NULL)
);

CREATE INDEX idx_payments_party ON payments(tenant_id, party_id);
";

const PAYMENT_DETAILS_SQL: &str = r"
CREATE TABLE payment_details (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id               UUID NOT NULL,
    payment_id              UUID NOT NULL REFERENCES payments(id),
    line_no                 INTEGER NOT NULL,
    payment_mode            VARCHAR(20) NOT NULL,
    amount_base             NUMERIC(19, 2) NOT NULL,
    bank_name               VARCHAR(255),
    instrument_number       VARCHAR(100),
    instrument_date         DATE,
    gateway_transaction_id  VARCHAR(255),
    gateway_status          VARCHAR(20),
    gateway_fee             NUMERIC(19, 2),
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_payment_details_line UNIQUE (payment_id, line_no),
    CONSTRAINT chk_payment_details_amount CHECK (amount_base > 0)
);
";

const PAYMENT_ALLOCATIONS_SQL: &str = r"
CREATE TABLE payment_allocations (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id               UUID NOT NULL,
    payment_id              UUID NOT NULL REFERENCES payments(id),
    invoice_kind            invoice_kind NOT NULL,
    document_id             UUID NOT NULL REFERENCES invoices(id),
    allocated_amount_base   NUMERIC(19, 2) NOT NULL,
    discount_amount         NUMERIC(19, 2) NOT NULL DEFAULT 0,
    adjustment_amount       NUMERIC(19, 2) NOT NULL DEFAULT 0,
    allocation_date         DATE NOT NULL,
    created_by              UUID NOT NULL,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_payment_allocations_document UNIQUE (payment_id, document_id),
    CONSTRAINT chk_payment_allocations_amount CHECK (allocated_amount_base > 0)
);

CREATE INDEX idx_payment_allocations_document ON payment_allocations(document_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_voucher_balance
-- Sum of debits equals sum of credits for every posted voucher
-- ============================================================
CREATE OR REPLACE FUNCTION check_voucher_balance()
RETURNS TRIGGER AS $$
DECLARE
    total_debit NUMERIC(19, 2);
    total_credit NUMERIC(19, 2);
    posted BOOLEAN;
BEGIN
    SELECT is_posted INTO posted
    FROM vouchers
    WHERE id = NEW.voucher_id;

    IF posted THEN
        SELECT
            COALESCE(SUM(debit_base), 0),
            COALESCE(SUM(credit_base), 0)
        INTO total_debit, total_credit
        FROM voucher_lines
        WHERE voucher_id = NEW.voucher_id;

        IF total_debit != total_credit THEN
            RAISE EXCEPTION 'Voucher % is not balanced: debit=%, credit=%',
                NEW.voucher_id, total_debit, total_credit;
        END IF;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_voucher_balance
AFTER INSERT OR UPDATE ON voucher_lines
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_voucher_balance();

-- ============================================================
-- FUNCTION: prevent_posted_changes
-- Voucher lines and ledger rows are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_changes()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Rows in % are immutable', TG_TABLE_NAME;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_voucher_lines_immutable
BEFORE UPDATE OR DELETE ON voucher_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_changes();

CREATE TRIGGER trg_ledgers_immutable
BEFORE UPDATE OR DELETE ON ledgers
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_changes();
";

const RLS_SQL: &str = r"
-- Application sets context per transaction: SET LOCAL app.current_tenant_id = 'tenant-uuid';
ALTER TABLE account_groups ENABLE ROW LEVEL SECURITY;
ALTER TABLE accounts ENABLE ROW LEVEL SECURITY;
ALTER TABLE account_configurations ENABLE ROW LEVEL SECURITY;
ALTER TABLE voucher_types ENABLE ROW LEVEL SECURITY;
ALTER TABLE vouchers ENABLE ROW LEVEL SECURITY;
ALTER TABLE voucher_lines ENABLE ROW LEVEL SECURITY;
ALTER TABLE ledgers ENABLE ROW LEVEL SECURITY;
ALTER TABLE parties ENABLE ROW LEVEL SECURITY;
ALTER TABLE invoices ENABLE ROW LEVEL SECURITY;
ALTER TABLE notes ENABLE ROW LEVEL SECURITY;
ALTER TABLE payments ENABLE ROW LEVEL SECURITY;
ALTER TABLE payment_details ENABLE ROW LEVEL SECURITY;
ALTER TABLE payment_allocations ENABLE ROW LEVEL SECURITY;

CREATE POLICY tenant_isolation ON account_groups
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON accounts
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON account_configurations
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON voucher_types
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON vouchers
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON voucher_lines
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON ledgers
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON parties
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON invoices
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON notes
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON payments
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON payment_details
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON payment_allocations
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payment_allocations CASCADE;
DROP TABLE IF EXISTS payment_details CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS notes CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS parties CASCADE;
DROP TABLE IF EXISTS ledgers CASCADE;
DROP TABLE IF EXISTS voucher_lines CASCADE;
DROP TABLE IF EXISTS vouchers CASCADE;
DROP TABLE IF EXISTS voucher_types CASCADE;
DROP TABLE IF EXISTS account_configurations CASCADE;
DROP TABLE IF EXISTS account_configuration_keys CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS account_groups CASCADE;

DROP FUNCTION IF EXISTS check_voucher_balance() CASCADE;
DROP FUNCTION IF EXISTS prevent_posted_changes() CASCADE;

DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS payment_type;
DROP TYPE IF EXISTS note_type;
DROP TYPE IF EXISTS invoice_payment_status;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS invoice_kind;
DROP TYPE IF EXISTS party_type;
DROP TYPE IF EXISTS account_type;
";
