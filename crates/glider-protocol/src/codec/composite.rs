//! Product codecs: a fixed sequence of field codecs, each paired with an accessor that borrows
//! the field out of the composed value, and a constructor that rebuilds the value. Fields are
//! read and written strictly in declaration order.

use super::Codec;
use crate::buffer::PacketBuffer;
use glider_common::{ProtocolVersion, Result};
use std::marker::PhantomData;

macro_rules! composite {
    ($(#[$doc:meta])* $name:ident, $ctor:ident; $($codec:ident $field:ident $getter:ident $index:tt),+) => {
        $(#[$doc])*
        pub struct $name<S, $($codec, $field, $getter,)+ K> {
            codecs: ($($codec,)+),
            getters: ($($getter,)+),
            constructor: K,
            _marker: PhantomData<fn() -> (S, $($field,)+)>,
        }

        #[allow(clippy::too_many_arguments, non_snake_case)]
        pub fn $ctor<S, $($codec, $field, $getter,)+ K>(
            $($codec: $codec, $getter: $getter,)+
            constructor: K,
        ) -> $name<S, $($codec, $field, $getter,)+ K>
        where
            $($codec: Codec<$field>, $getter: Fn(&S) -> &$field + Send + Sync,)+
            K: Fn($($field),+) -> S + Send + Sync,
        {
            $name {
                codecs: ($($codec,)+),
                getters: ($($getter,)+),
                constructor,
                _marker: PhantomData,
            }
        }

        impl<S, $($codec, $field, $getter,)+ K> Codec<S> for $name<S, $($codec, $field, $getter,)+ K>
        where
            $($codec: Codec<$field>, $getter: Fn(&S) -> &$field + Send + Sync,)+
            K: Fn($($field),+) -> S + Send + Sync,
        {
            #[allow(non_snake_case)]
            fn decode(&self, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<S> {
                $(let $field = self.codecs.$index.decode(buf, version)?;)+
                Ok((self.constructor)($($field),+))
            }

            fn encode(&self, value: &S, buf: &mut PacketBuffer, version: ProtocolVersion) -> Result<()> {
                $(self.codecs.$index.encode((self.getters.$index)(value), buf, version)?;)+
                Ok(())
            }
        }
    };
}

composite!(Composite1, composite1; C1 T1 G1 0);
composite!(Composite2, composite2; C1 T1 G1 0, C2 T2 G2 1);
composite!(Composite3, composite3; C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2);
composite!(Composite4, composite4; C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3);
composite!(Composite5, composite5; C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4);
composite!(
    Composite6, composite6;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5
);
composite!(
    Composite7, composite7;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5, C7 T7 G7 6
);
composite!(
    Composite8, composite8;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5, C7 T7 G7 6,
    C8 T8 G8 7
);
composite!(
    Composite9, composite9;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5, C7 T7 G7 6,
    C8 T8 G8 7, C9 T9 G9 8
);
composite!(
    Composite10, composite10;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5, C7 T7 G7 6,
    C8 T8 G8 7, C9 T9 G9 8, C10 T10 G10 9
);
composite!(
    Composite11, composite11;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5, C7 T7 G7 6,
    C8 T8 G8 7, C9 T9 G9 8, C10 T10 G10 9, C11 T11 G11 10
);
composite!(
    Composite12, composite12;
    C1 T1 G1 0, C2 T2 G2 1, C3 T3 G3 2, C4 T4 G4 3, C5 T5 G5 4, C6 T6 G6 5, C7 T7 G7 6,
    C8 T8 G8 7, C9 T9 G9 8, C10 T10 G10 9, C11 T11 G11 10, C12 T12 G12 11
);
