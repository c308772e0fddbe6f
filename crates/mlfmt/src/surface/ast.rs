use crate::lexer::Token;

/// A dot-qualified identifier such as `A.B.x`. Qualifier components keep
/// their `.` tokens so the printer re-emits the path verbatim.
#[derive(Debug, Clone)]
pub struct LongId {
    pub qualifiers: Vec<(Token, Token)>,
    pub name: Token,
}

impl LongId {
    pub fn plain(name: Token) -> LongId {
        LongId {
            qualifiers: Vec::new(),
            name,
        }
    }

    pub fn is_plain(&self) -> bool {
        self.qualifiers.is_empty()
    }

    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for (part, _) in &self.qualifiers {
            out.push_str(&part.text);
            out.push('.');
        }
        out.push_str(&self.name.text);
        out
    }
}

/// Optional parenthesized list with delimiters: nothing, a single element,
/// or `( e1, e2, ... )` with every token retained.
#[derive(Debug, Clone)]
pub enum SyntaxSeq<T> {
    Empty,
    One(T),
    Many {
        left: Token,
        elems: Vec<T>,
        delims: Vec<Token>,
        right: Token,
    },
}

// -- types -------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Ty {
    Var(Token),
    Record {
        left: Token,
        rows: Vec<TyRow>,
        delims: Vec<Token>,
        right: Token,
    },
    Con {
        args: SyntaxSeq<Box<Ty>>,
        name: LongId,
    },
    Paren {
        left: Token,
        ty: Box<Ty>,
        right: Token,
    },
    Tuple {
        elems: Vec<Ty>,
        delims: Vec<Token>,
    },
    Arrow {
        param: Box<Ty>,
        arrow: Token,
        result: Box<Ty>,
    },
}

#[derive(Debug, Clone)]
pub struct TyRow {
    pub label: Token,
    pub colon: Token,
    pub ty: Ty,
}

// -- patterns ----------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Pat {
    Wildcard(Token),
    Const(Token),
    Unit {
        left: Token,
        right: Token,
    },
    Ident {
        op_kw: Option<Token>,
        id: LongId,
    },
    Paren {
        left: Token,
        pat: Box<Pat>,
        right: Token,
    },
    Tuple {
        left: Token,
        elems: Vec<Pat>,
        delims: Vec<Token>,
        right: Token,
    },
    List {
        left: Token,
        elems: Vec<Pat>,
        delims: Vec<Token>,
        right: Token,
    },
    Record {
        left: Token,
        rows: Vec<PatRow>,
        delims: Vec<Token>,
        right: Token,
    },
    Con {
        op_kw: Option<Token>,
        id: LongId,
        arg: Box<Pat>,
    },
    Infix {
        left: Box<Pat>,
        op: Token,
        right: Box<Pat>,
    },
    Ascribe {
        pat: Box<Pat>,
        colon: Token,
        ty: Ty,
    },
    As {
        lhs: Box<Pat>,
        as_kw: Token,
        rhs: Box<Pat>,
    },
}

#[derive(Debug, Clone)]
pub enum PatRow {
    /// The flexible-record `...` row.
    Rest(Token),
    Labeled {
        label: Token,
        eq: Token,
        pat: Pat,
    },
    /// Label punning: `x`, `x : ty`, `x as pat`, and combinations.
    Punned {
        id: Token,
        ty: Option<(Token, Ty)>,
        as_pat: Option<(Token, Box<Pat>)>,
    },
}

// -- expressions -------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Exp {
    Const(Token),
    Unit {
        left: Token,
        right: Token,
    },
    Ident {
        op_kw: Option<Token>,
        id: LongId,
    },
    Selector {
        hash: Token,
        label: Token,
    },
    Paren {
        left: Token,
        exp: Box<Exp>,
        right: Token,
    },
    Tuple {
        left: Token,
        elems: Vec<Exp>,
        delims: Vec<Token>,
        right: Token,
    },
    Sequence {
        left: Token,
        elems: Vec<Exp>,
        delims: Vec<Token>,
        right: Token,
    },
    List {
        left: Token,
        elems: Vec<Exp>,
        delims: Vec<Token>,
        right: Token,
    },
    Record {
        left: Token,
        rows: Vec<ExpRow>,
        delims: Vec<Token>,
        right: Token,
    },
    App {
        func: Box<Exp>,
        arg: Box<Exp>,
    },
    Infix {
        left: Box<Exp>,
        op: Token,
        right: Box<Exp>,
    },
    Andalso {
        left: Box<Exp>,
        kw: Token,
        right: Box<Exp>,
    },
    Orelse {
        left: Box<Exp>,
        kw: Token,
        right: Box<Exp>,
    },
    Ascribe {
        exp: Box<Exp>,
        colon: Token,
        ty: Ty,
    },
    If {
        if_kw: Token,
        cond: Box<Exp>,
        then_kw: Token,
        then_exp: Box<Exp>,
        else_kw: Token,
        else_exp: Box<Exp>,
    },
    While {
        while_kw: Token,
        cond: Box<Exp>,
        do_kw: Token,
        body: Box<Exp>,
    },
    Raise {
        kw: Token,
        exp: Box<Exp>,
    },
    Handle {
        exp: Box<Exp>,
        kw: Token,
        arms: Match,
    },
    Case {
        case_kw: Token,
        exp: Box<Exp>,
        of_kw: Token,
        arms: Match,
    },
    Fn {
        kw: Token,
        arms: Match,
    },
    Let {
        let_kw: Token,
        dec: Box<Dec>,
        in_kw: Token,
        body: Vec<Exp>,
        delims: Vec<Token>,
        end_kw: Token,
    },
}

#[derive(Debug, Clone)]
pub struct ExpRow {
    pub label: Token,
    pub eq: Token,
    pub exp: Exp,
}

/// One-or-more `pat => exp` rules separated by `|`.
#[derive(Debug, Clone)]
pub struct Match {
    pub arms: Vec<Arm>,
    pub delims: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct Arm {
    pub pat: Pat,
    pub arrow: Token,
    pub exp: Exp,
}

// -- core declarations -------------------------------------------------

#[derive(Debug, Clone)]
pub enum Dec {
    Val {
        val_kw: Token,
        rec_kw: Option<Token>,
        tyvars: SyntaxSeq<Token>,
        bindings: Vec<ValBind>,
        and_kws: Vec<Token>,
    },
    Fun {
        fun_kw: Token,
        tyvars: SyntaxSeq<Token>,
        bindings: Vec<FunBind>,
        and_kws: Vec<Token>,
    },
    Type {
        type_kw: Token,
        bindings: Vec<TyBind>,
        and_kws: Vec<Token>,
    },
    Datatype {
        datatype_kw: Token,
        bindings: Vec<DatBind>,
        and_kws: Vec<Token>,
        withtype: Option<WithType>,
    },
    DatatypeRepl {
        datatype_kw: Token,
        name: Token,
        eq: Token,
        repl_kw: Token,
        rhs: LongId,
    },
    Abstype {
        abstype_kw: Token,
        bindings: Vec<DatBind>,
        and_kws: Vec<Token>,
        withtype: Option<WithType>,
        with_kw: Token,
        dec: Box<Dec>,
        end_kw: Token,
    },
    Exception {
        exception_kw: Token,
        bindings: Vec<ExBind>,
        and_kws: Vec<Token>,
    },
    Local {
        local_kw: Token,
        first: Box<Dec>,
        in_kw: Token,
        second: Box<Dec>,
        end_kw: Token,
    },
    Open {
        open_kw: Token,
        ids: Vec<LongId>,
    },
    Infix {
        kw: Token,
        precedence: Option<Token>,
        ids: Vec<Token>,
    },
    Nonfix {
        kw: Token,
        ids: Vec<Token>,
    },
    Seq {
        decs: Vec<Dec>,
        delims: Vec<Option<Token>>,
    },
    Empty,
}

#[derive(Debug, Clone)]
pub struct ValBind {
    pub pat: Pat,
    pub eq: Token,
    pub exp: Exp,
}

#[derive(Debug, Clone)]
pub struct FunBind {
    pub clauses: Vec<FunClause>,
    pub delims: Vec<Token>,
}

#[derive(Debug, Clone)]
pub enum FunClauseHead {
    Prefix {
        op_kw: Option<Token>,
        name: Token,
        args: Vec<Pat>,
    },
    Infix {
        left: Pat,
        name: Token,
        right: Pat,
    },
    CurriedInfix {
        left_paren: Token,
        left: Pat,
        name: Token,
        right: Pat,
        right_paren: Token,
        args: Vec<Pat>,
    },
}

impl FunClauseHead {
    pub fn name(&self) -> &Token {
        match self {
            FunClauseHead::Prefix { name, .. } => name,
            FunClauseHead::Infix { name, .. } => name,
            FunClauseHead::CurriedInfix { name, .. } => name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            FunClauseHead::Prefix { args, .. } => args.len(),
            FunClauseHead::Infix { .. } => 1,
            FunClauseHead::CurriedInfix { args, .. } => 1 + args.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunClause {
    pub head: FunClauseHead,
    pub ty: Option<(Token, Ty)>,
    pub eq: Token,
    pub body: Exp,
}

#[derive(Debug, Clone)]
pub struct TyBind {
    pub tyvars: SyntaxSeq<Token>,
    pub name: Token,
    pub eq: Token,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub struct DatBind {
    pub tyvars: SyntaxSeq<Token>,
    pub name: Token,
    pub eq: Token,
    pub cons: Vec<ConBind>,
    pub delims: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct ConBind {
    pub op_kw: Option<Token>,
    pub name: Token,
    pub of_ty: Option<(Token, Ty)>,
}

#[derive(Debug, Clone)]
pub struct WithType {
    pub withtype_kw: Token,
    pub bindings: Vec<TyBind>,
    pub and_kws: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct ExBind {
    pub op_kw: Option<Token>,
    pub name: Token,
    pub kind: ExBindKind,
}

#[derive(Debug, Clone)]
pub enum ExBindKind {
    Plain,
    OfTy(Token, Ty),
    Eq {
        eq: Token,
        op_kw: Option<Token>,
        rhs: LongId,
    },
}

// -- signatures --------------------------------------------------------

#[derive(Debug, Clone)]
pub enum SigExp {
    Id(Token),
    Sig {
        sig_kw: Token,
        spec: Box<Spec>,
        end_kw: Token,
    },
    Where {
        sigexp: Box<SigExp>,
        clauses: Vec<WhereClause>,
    },
}

/// `where type tyvarseq longtycon = ty`; chained clauses keep their own
/// `where`/`and` keyword.
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub where_kw: Token,
    pub type_kw: Token,
    pub tyvars: SyntaxSeq<Token>,
    pub name: LongId,
    pub eq: Token,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub enum Spec {
    Val {
        val_kw: Token,
        descs: Vec<ValDesc>,
        and_kws: Vec<Token>,
    },
    Type {
        type_kw: Token,
        descs: Vec<TyDesc>,
        and_kws: Vec<Token>,
    },
    Eqtype {
        eqtype_kw: Token,
        descs: Vec<TyDesc>,
        and_kws: Vec<Token>,
    },
    Datatype {
        datatype_kw: Token,
        bindings: Vec<DatBind>,
        and_kws: Vec<Token>,
    },
    DatatypeRepl {
        datatype_kw: Token,
        name: Token,
        eq: Token,
        repl_kw: Token,
        rhs: LongId,
    },
    Exception {
        exception_kw: Token,
        descs: Vec<ConBind>,
        and_kws: Vec<Token>,
    },
    Structure {
        structure_kw: Token,
        descs: Vec<StrDesc>,
        and_kws: Vec<Token>,
    },
    Include {
        include_kw: Token,
        sigexp: SigExp,
    },
    Sharing {
        spec: Box<Spec>,
        sharing_kw: Token,
        type_kw: Option<Token>,
        ids: Vec<LongId>,
        eq_delims: Vec<Token>,
    },
    Seq {
        specs: Vec<Spec>,
        delims: Vec<Option<Token>>,
    },
    Empty,
}

#[derive(Debug, Clone)]
pub struct ValDesc {
    pub name: Token,
    pub colon: Token,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub struct TyDesc {
    pub tyvars: SyntaxSeq<Token>,
    pub name: Token,
    pub eq_ty: Option<(Token, Ty)>,
}

#[derive(Debug, Clone)]
pub struct StrDesc {
    pub name: Token,
    pub colon: Token,
    pub sigexp: SigExp,
}

// -- structures and functors -------------------------------------------

#[derive(Debug, Clone)]
pub enum StrExp {
    Id(LongId),
    Struct {
        struct_kw: Token,
        dec: Box<StrDec>,
        end_kw: Token,
    },
    /// `strexp : sigexp` (transparent) or `strexp :> sigexp` (opaque);
    /// the token distinguishes them.
    Ascribe {
        strexp: Box<StrExp>,
        colon: Token,
        sigexp: SigExp,
    },
    FunApp {
        name: Token,
        left: Token,
        arg: FunAppArg,
        right: Token,
    },
    Let {
        let_kw: Token,
        dec: Box<StrDec>,
        in_kw: Token,
        strexp: Box<StrExp>,
        end_kw: Token,
    },
}

#[derive(Debug, Clone)]
pub enum FunAppArg {
    StrExp(Box<StrExp>),
    StrDec(Box<StrDec>),
}

#[derive(Debug, Clone)]
pub enum StrDec {
    Core(Dec),
    Structure {
        structure_kw: Token,
        bindings: Vec<StrBind>,
        and_kws: Vec<Token>,
    },
    Local {
        local_kw: Token,
        first: Box<StrDec>,
        in_kw: Token,
        second: Box<StrDec>,
        end_kw: Token,
    },
    Seq {
        decs: Vec<StrDec>,
        delims: Vec<Option<Token>>,
    },
}

#[derive(Debug, Clone)]
pub struct StrBind {
    pub name: Token,
    pub ascription: Option<(Token, SigExp)>,
    pub eq: Token,
    pub strexp: StrExp,
}

// -- top level ---------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SigBind {
    pub name: Token,
    pub eq: Token,
    pub sigexp: SigExp,
}

#[derive(Debug, Clone)]
pub enum FunParam {
    Plain {
        name: Token,
        colon: Token,
        sigexp: SigExp,
    },
    Opened {
        spec: Spec,
    },
}

#[derive(Debug, Clone)]
pub struct FunctorBind {
    pub name: Token,
    pub left: Token,
    pub param: FunParam,
    pub right: Token,
    pub ascription: Option<(Token, SigExp)>,
    pub eq: Token,
    pub strexp: StrExp,
}

#[derive(Debug, Clone)]
pub enum TopDec {
    Str(StrDec),
    Sig {
        signature_kw: Token,
        bindings: Vec<SigBind>,
        and_kws: Vec<Token>,
    },
    Functor {
        functor_kw: Token,
        bindings: Vec<FunctorBind>,
        and_kws: Vec<Token>,
    },
}

/// A whole source file: top declarations with their optional trailing
/// semicolons, plus the EOF token (which carries any trailing comments).
#[derive(Debug, Clone)]
pub struct Ast {
    pub topdecs: Vec<(TopDec, Option<Token>)>,
    pub eof: Token,
}
